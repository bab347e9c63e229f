//! Embedded place table for text-based place recognition.
//!
//! Countries carry their ISO 3166-1 alpha-2 code, which doubles as the phone
//! region. Cities carry the code of the country they belong to; the offline
//! geocoder answers from this table, the resolver only uses it to recognize
//! city tokens.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryEntry {
    pub name: &'static str,
    pub alpha2: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityEntry {
    pub name: &'static str,
    pub alpha2: &'static str,
}

/// Recognized places in text order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlaceMatches {
    pub countries: Vec<CountryEntry>,
    pub cities: Vec<CityEntry>,
}

#[derive(Debug)]
pub struct Gazetteer {
    countries: HashMap<String, CountryEntry>,
    by_code: HashMap<&'static str, CountryEntry>,
    cities: HashMap<String, CityEntry>,
    max_country_words: usize,
    max_city_words: usize,
}

static GLOBAL: Lazy<Gazetteer> = Lazy::new(Gazetteer::build);

impl Gazetteer {
    pub fn global() -> &'static Gazetteer {
        &GLOBAL
    }

    fn build() -> Self {
        let mut countries = HashMap::new();
        let mut by_code = HashMap::new();
        for (name, alpha2, aliases) in COUNTRIES {
            let entry = CountryEntry { name, alpha2 };
            by_code.insert(*alpha2, entry);
            countries.insert(normalize_place(name), entry);
            for alias in *aliases {
                countries.insert(normalize_place(alias), entry);
            }
        }

        let mut cities = HashMap::new();
        for (name, alpha2, aliases) in CITIES {
            let entry = CityEntry { name, alpha2 };
            cities.entry(normalize_place(name)).or_insert(entry);
            for alias in *aliases {
                cities.entry(normalize_place(alias)).or_insert(entry);
            }
        }

        let max_words = |keys: &mut dyn Iterator<Item = &String>| {
            keys.map(|k| k.split(' ').count()).max().unwrap_or(1)
        };
        let max_country_words = max_words(&mut countries.keys());
        let max_city_words = max_words(&mut cities.keys());

        Self { countries, by_code, cities, max_country_words, max_city_words }
    }

    /// Scan `text` left to right and report every country and city token.
    /// At each position the longest name across both tables claims the
    /// words, so "Mexico City" is a city and not the country Mexico. A name
    /// that is both a country and a city of the same length is reported as
    /// both.
    pub fn recognize(&self, text: &str) -> PlaceMatches {
        let normalized = normalize_place(text);
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
        let mut matches = PlaceMatches::default();
        let mut i = 0;
        while i < words.len() {
            let country = longest_at(&words[i..], self.max_country_words, &self.countries);
            let city = longest_at(&words[i..], self.max_city_words, &self.cities);
            let country_len = country.map_or(0, |(_, n)| n);
            let city_len = city.map_or(0, |(_, n)| n);

            if country_len == 0 && city_len == 0 {
                i += 1;
                continue;
            }
            if country_len >= city_len {
                if let Some((entry, _)) = country {
                    matches.countries.push(entry);
                }
            }
            if city_len >= country_len {
                if let Some((entry, _)) = city {
                    matches.cities.push(entry);
                }
            }
            i += country_len.max(city_len);
        }
        matches
    }

    /// Exact lookup by canonical name or alias, case-insensitive.
    pub fn country_by_name(&self, name: &str) -> Option<CountryEntry> {
        self.countries.get(&normalize_place(name)).copied()
    }

    pub fn country_by_code(&self, alpha2: &str) -> Option<CountryEntry> {
        self.by_code.get(alpha2.trim().to_ascii_uppercase().as_str()).copied()
    }

    pub fn city(&self, name: &str) -> Option<CityEntry> {
        self.cities.get(&normalize_place(name)).copied()
    }
}

/// Longest table entry starting at the first word, with its word count.
fn longest_at<T: Copy>(words: &[&str], max_words: usize, table: &HashMap<String, T>) -> Option<(T, usize)> {
    let longest = max_words.min(words.len());
    (1..=longest)
        .rev()
        .find_map(|n| table.get(&words[..n].join(" ")).map(|entry| (*entry, n)))
}

/// Lowercase, turn punctuation into spaces, collapse whitespace.
fn normalize_place(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

type Place = (&'static str, &'static str, &'static [&'static str]);

const COUNTRIES: &[Place] = &[
    ("Afghanistan", "AF", &[]),
    ("Albania", "AL", &[]),
    ("Algeria", "DZ", &[]),
    ("Andorra", "AD", &[]),
    ("Angola", "AO", &[]),
    ("Antigua and Barbuda", "AG", &[]),
    ("Argentina", "AR", &[]),
    ("Armenia", "AM", &[]),
    ("Australia", "AU", &[]),
    ("Austria", "AT", &["Österreich", "Osterreich"]),
    ("Azerbaijan", "AZ", &[]),
    ("Bahamas", "BS", &["The Bahamas"]),
    ("Bahrain", "BH", &[]),
    ("Bangladesh", "BD", &[]),
    ("Barbados", "BB", &[]),
    ("Belarus", "BY", &[]),
    ("Belgium", "BE", &["Belgique", "België"]),
    ("Belize", "BZ", &[]),
    ("Benin", "BJ", &[]),
    ("Bhutan", "BT", &[]),
    ("Bolivia", "BO", &[]),
    ("Bosnia and Herzegovina", "BA", &["Bosnia"]),
    ("Botswana", "BW", &[]),
    ("Brazil", "BR", &["Brasil"]),
    ("Brunei", "BN", &["Brunei Darussalam"]),
    ("Bulgaria", "BG", &[]),
    ("Burkina Faso", "BF", &[]),
    ("Burundi", "BI", &[]),
    ("Cambodia", "KH", &[]),
    ("Cameroon", "CM", &[]),
    ("Canada", "CA", &[]),
    ("Cape Verde", "CV", &["Cabo Verde"]),
    ("Central African Republic", "CF", &[]),
    ("Chad", "TD", &[]),
    ("Chile", "CL", &[]),
    ("China", "CN", &["PRC"]),
    ("Colombia", "CO", &[]),
    ("Comoros", "KM", &[]),
    ("Democratic Republic of the Congo", "CD", &["DR Congo", "DRC"]),
    ("Republic of the Congo", "CG", &["Congo"]),
    ("Costa Rica", "CR", &[]),
    ("Croatia", "HR", &["Hrvatska"]),
    ("Cuba", "CU", &[]),
    ("Cyprus", "CY", &[]),
    ("Czech Republic", "CZ", &["Czechia"]),
    ("Denmark", "DK", &["Danmark"]),
    ("Djibouti", "DJ", &[]),
    ("Dominica", "DM", &[]),
    ("Dominican Republic", "DO", &[]),
    ("Ecuador", "EC", &[]),
    ("Egypt", "EG", &[]),
    ("El Salvador", "SV", &[]),
    ("Equatorial Guinea", "GQ", &[]),
    ("Eritrea", "ER", &[]),
    ("Estonia", "EE", &[]),
    ("Eswatini", "SZ", &["Swaziland"]),
    ("Ethiopia", "ET", &[]),
    ("Fiji", "FJ", &[]),
    ("Finland", "FI", &["Suomi"]),
    ("France", "FR", &[]),
    ("Gabon", "GA", &[]),
    ("Gambia", "GM", &["The Gambia"]),
    ("Georgia", "GE", &[]),
    ("Germany", "DE", &["Deutschland"]),
    ("Ghana", "GH", &[]),
    ("Greece", "GR", &["Hellas"]),
    ("Grenada", "GD", &[]),
    ("Guatemala", "GT", &[]),
    ("Guinea", "GN", &[]),
    ("Guinea-Bissau", "GW", &[]),
    ("Guyana", "GY", &[]),
    ("Haiti", "HT", &[]),
    ("Honduras", "HN", &[]),
    ("Hong Kong", "HK", &[]),
    ("Hungary", "HU", &["Magyarország"]),
    ("Iceland", "IS", &[]),
    ("India", "IN", &[]),
    ("Indonesia", "ID", &[]),
    ("Iran", "IR", &[]),
    ("Iraq", "IQ", &[]),
    ("Ireland", "IE", &["Eire"]),
    ("Israel", "IL", &[]),
    ("Italy", "IT", &["Italia"]),
    ("Ivory Coast", "CI", &["Côte d'Ivoire", "Cote d'Ivoire"]),
    ("Jamaica", "JM", &[]),
    ("Japan", "JP", &[]),
    ("Jordan", "JO", &[]),
    ("Kazakhstan", "KZ", &[]),
    ("Kenya", "KE", &[]),
    ("Kiribati", "KI", &[]),
    ("Kosovo", "XK", &[]),
    ("Kuwait", "KW", &[]),
    ("Kyrgyzstan", "KG", &[]),
    ("Laos", "LA", &[]),
    ("Latvia", "LV", &[]),
    ("Lebanon", "LB", &[]),
    ("Lesotho", "LS", &[]),
    ("Liberia", "LR", &[]),
    ("Libya", "LY", &[]),
    ("Liechtenstein", "LI", &[]),
    ("Lithuania", "LT", &[]),
    ("Luxembourg", "LU", &[]),
    ("Macau", "MO", &["Macao"]),
    ("Madagascar", "MG", &[]),
    ("Malawi", "MW", &[]),
    ("Malaysia", "MY", &[]),
    ("Maldives", "MV", &[]),
    ("Mali", "ML", &[]),
    ("Malta", "MT", &[]),
    ("Marshall Islands", "MH", &[]),
    ("Mauritania", "MR", &[]),
    ("Mauritius", "MU", &[]),
    ("Mexico", "MX", &["México"]),
    ("Micronesia", "FM", &[]),
    ("Moldova", "MD", &[]),
    ("Monaco", "MC", &[]),
    ("Mongolia", "MN", &[]),
    ("Montenegro", "ME", &[]),
    ("Morocco", "MA", &["Maroc"]),
    ("Mozambique", "MZ", &[]),
    ("Myanmar", "MM", &["Burma"]),
    ("Namibia", "NA", &[]),
    ("Nauru", "NR", &[]),
    ("Nepal", "NP", &[]),
    ("Netherlands", "NL", &["The Netherlands", "Holland", "Nederland"]),
    ("New Zealand", "NZ", &[]),
    ("Nicaragua", "NI", &[]),
    ("Niger", "NE", &[]),
    ("Nigeria", "NG", &[]),
    ("North Korea", "KP", &[]),
    ("North Macedonia", "MK", &["Macedonia"]),
    ("Norway", "NO", &["Norge"]),
    ("Oman", "OM", &[]),
    ("Pakistan", "PK", &[]),
    ("Palau", "PW", &[]),
    ("Palestine", "PS", &[]),
    ("Panama", "PA", &[]),
    ("Papua New Guinea", "PG", &[]),
    ("Paraguay", "PY", &[]),
    ("Peru", "PE", &["Perú"]),
    ("Philippines", "PH", &[]),
    ("Poland", "PL", &["Polska"]),
    ("Portugal", "PT", &[]),
    ("Puerto Rico", "PR", &[]),
    ("Qatar", "QA", &[]),
    ("Romania", "RO", &[]),
    ("Russia", "RU", &["Russian Federation"]),
    ("Rwanda", "RW", &[]),
    ("Saint Kitts and Nevis", "KN", &[]),
    ("Saint Lucia", "LC", &[]),
    ("Saint Vincent and the Grenadines", "VC", &[]),
    ("Samoa", "WS", &[]),
    ("San Marino", "SM", &[]),
    ("Sao Tome and Principe", "ST", &["São Tomé and Príncipe"]),
    ("Saudi Arabia", "SA", &[]),
    ("Senegal", "SN", &["Sénégal"]),
    ("Serbia", "RS", &[]),
    ("Seychelles", "SC", &[]),
    ("Sierra Leone", "SL", &[]),
    ("Singapore", "SG", &[]),
    ("Slovakia", "SK", &[]),
    ("Slovenia", "SI", &[]),
    ("Solomon Islands", "SB", &[]),
    ("Somalia", "SO", &[]),
    ("South Africa", "ZA", &[]),
    ("South Korea", "KR", &["Korea", "Republic of Korea"]),
    ("South Sudan", "SS", &[]),
    ("Spain", "ES", &["España", "Espana"]),
    ("Sri Lanka", "LK", &[]),
    ("Sudan", "SD", &[]),
    ("Suriname", "SR", &[]),
    ("Sweden", "SE", &["Sverige"]),
    ("Switzerland", "CH", &["Schweiz", "Suisse", "Svizzera"]),
    ("Syria", "SY", &[]),
    ("Taiwan", "TW", &[]),
    ("Tajikistan", "TJ", &[]),
    ("Tanzania", "TZ", &[]),
    ("Thailand", "TH", &[]),
    ("Timor-Leste", "TL", &["East Timor"]),
    ("Togo", "TG", &[]),
    ("Tonga", "TO", &[]),
    ("Trinidad and Tobago", "TT", &[]),
    ("Tunisia", "TN", &["Tunisie"]),
    ("Turkey", "TR", &["Türkiye", "Turkiye"]),
    ("Turkmenistan", "TM", &[]),
    ("Tuvalu", "TV", &[]),
    ("Uganda", "UG", &[]),
    ("Ukraine", "UA", &[]),
    ("United Arab Emirates", "AE", &["UAE"]),
    ("United Kingdom", "GB", &["UK", "Great Britain", "Britain", "England", "Scotland", "Wales", "Northern Ireland"]),
    ("United States", "US", &["USA", "United States of America", "U S A", "U S"]),
    ("Uruguay", "UY", &[]),
    ("Uzbekistan", "UZ", &[]),
    ("Vanuatu", "VU", &[]),
    ("Vatican City", "VA", &["Holy See"]),
    ("Venezuela", "VE", &[]),
    ("Vietnam", "VN", &["Viet Nam"]),
    ("Yemen", "YE", &[]),
    ("Zambia", "ZM", &[]),
    ("Zimbabwe", "ZW", &[]),
];

const CITIES: &[Place] = &[
    // Europe
    ("Paris", "FR", &[]),
    ("Lyon", "FR", &[]),
    ("Marseille", "FR", &["Marseilles"]),
    ("Toulouse", "FR", &[]),
    ("Nice", "FR", &[]),
    ("Nantes", "FR", &[]),
    ("Bordeaux", "FR", &[]),
    ("Lille", "FR", &[]),
    ("Strasbourg", "FR", &[]),
    ("London", "GB", &[]),
    ("Manchester", "GB", &[]),
    ("Birmingham", "GB", &[]),
    ("Liverpool", "GB", &[]),
    ("Leeds", "GB", &[]),
    ("Glasgow", "GB", &[]),
    ("Edinburgh", "GB", &[]),
    ("Bristol", "GB", &[]),
    ("Cardiff", "GB", &[]),
    ("Belfast", "GB", &[]),
    ("Dublin", "IE", &[]),
    ("Cork", "IE", &[]),
    ("Madrid", "ES", &[]),
    ("Barcelona", "ES", &[]),
    ("Valencia", "ES", &[]),
    ("Seville", "ES", &["Sevilla"]),
    ("Malaga", "ES", &["Málaga"]),
    ("Bilbao", "ES", &[]),
    ("Lisbon", "PT", &["Lisboa"]),
    ("Porto", "PT", &["Oporto"]),
    ("Rome", "IT", &["Roma"]),
    ("Milan", "IT", &["Milano"]),
    ("Naples", "IT", &["Napoli"]),
    ("Turin", "IT", &["Torino"]),
    ("Florence", "IT", &["Firenze"]),
    ("Venice", "IT", &["Venezia"]),
    ("Bologna", "IT", &[]),
    ("Berlin", "DE", &[]),
    ("Hamburg", "DE", &[]),
    ("Munich", "DE", &["München", "Munchen"]),
    ("Cologne", "DE", &["Köln", "Koln"]),
    ("Frankfurt", "DE", &["Frankfurt am Main"]),
    ("Stuttgart", "DE", &[]),
    ("Düsseldorf", "DE", &["Dusseldorf"]),
    ("Leipzig", "DE", &[]),
    ("Dresden", "DE", &[]),
    ("Amsterdam", "NL", &[]),
    ("Rotterdam", "NL", &[]),
    ("The Hague", "NL", &["Den Haag"]),
    ("Utrecht", "NL", &[]),
    ("Eindhoven", "NL", &[]),
    ("Brussels", "BE", &["Bruxelles", "Brussel"]),
    ("Antwerp", "BE", &["Antwerpen"]),
    ("Ghent", "BE", &["Gent"]),
    ("Zurich", "CH", &["Zürich"]),
    ("Geneva", "CH", &["Genève", "Geneve"]),
    ("Basel", "CH", &[]),
    ("Bern", "CH", &["Berne"]),
    ("Lausanne", "CH", &[]),
    ("Vienna", "AT", &["Wien"]),
    ("Salzburg", "AT", &[]),
    ("Prague", "CZ", &["Praha"]),
    ("Warsaw", "PL", &["Warszawa"]),
    ("Krakow", "PL", &["Kraków", "Cracow"]),
    ("Budapest", "HU", &[]),
    ("Bucharest", "RO", &["București", "Bucuresti"]),
    ("Sofia", "BG", &[]),
    ("Athens", "GR", &["Athina"]),
    ("Thessaloniki", "GR", &[]),
    ("Belgrade", "RS", &["Beograd"]),
    ("Zagreb", "HR", &[]),
    ("Ljubljana", "SI", &[]),
    ("Bratislava", "SK", &[]),
    ("Copenhagen", "DK", &["København", "Kobenhavn"]),
    ("Stockholm", "SE", &[]),
    ("Gothenburg", "SE", &["Göteborg", "Goteborg"]),
    ("Oslo", "NO", &[]),
    ("Bergen", "NO", &[]),
    ("Helsinki", "FI", &[]),
    ("Reykjavik", "IS", &["Reykjavík"]),
    ("Tallinn", "EE", &[]),
    ("Riga", "LV", &[]),
    ("Vilnius", "LT", &[]),
    ("Kyiv", "UA", &["Kiev"]),
    ("Moscow", "RU", &["Moskva"]),
    ("Saint Petersburg", "RU", &["St Petersburg", "St. Petersburg"]),
    ("Istanbul", "TR", &[]),
    ("Ankara", "TR", &[]),
    ("Minsk", "BY", &[]),
    // Americas
    ("New York", "US", &["New York City", "NYC"]),
    ("Los Angeles", "US", &[]),
    ("Chicago", "US", &[]),
    ("Houston", "US", &[]),
    ("Phoenix", "US", &[]),
    ("Philadelphia", "US", &[]),
    ("San Antonio", "US", &[]),
    ("San Diego", "US", &[]),
    ("Dallas", "US", &[]),
    ("San Jose", "US", &[]),
    ("Austin", "US", &[]),
    ("San Francisco", "US", &[]),
    ("Seattle", "US", &[]),
    ("Denver", "US", &[]),
    ("Boston", "US", &[]),
    ("Miami", "US", &[]),
    ("Atlanta", "US", &[]),
    ("Washington", "US", &["Washington DC", "Washington D C"]),
    ("Las Vegas", "US", &[]),
    ("Portland", "US", &[]),
    ("Detroit", "US", &[]),
    ("Minneapolis", "US", &[]),
    ("New Orleans", "US", &[]),
    ("Toronto", "CA", &[]),
    ("Montreal", "CA", &["Montréal"]),
    ("Vancouver", "CA", &[]),
    ("Calgary", "CA", &[]),
    ("Ottawa", "CA", &[]),
    ("Quebec City", "CA", &["Québec"]),
    ("Mexico City", "MX", &["Ciudad de México", "CDMX"]),
    ("Guadalajara", "MX", &[]),
    ("Monterrey", "MX", &[]),
    ("Havana", "CU", &["La Habana"]),
    ("Bogota", "CO", &["Bogotá"]),
    ("Medellin", "CO", &["Medellín"]),
    ("Lima", "PE", &[]),
    ("Quito", "EC", &[]),
    ("Caracas", "VE", &[]),
    ("Santiago", "CL", &["Santiago de Chile"]),
    ("Buenos Aires", "AR", &[]),
    ("Cordoba", "AR", &["Córdoba"]),
    ("Montevideo", "UY", &[]),
    ("Asuncion", "PY", &["Asunción"]),
    ("La Paz", "BO", &[]),
    ("Sao Paulo", "BR", &["São Paulo"]),
    ("Rio de Janeiro", "BR", &["Rio"]),
    ("Brasilia", "BR", &["Brasília"]),
    ("Salvador", "BR", &[]),
    ("Belo Horizonte", "BR", &[]),
    // Africa and Middle East
    ("Cairo", "EG", &[]),
    ("Alexandria", "EG", &[]),
    ("Casablanca", "MA", &[]),
    ("Rabat", "MA", &[]),
    ("Marrakesh", "MA", &["Marrakech"]),
    ("Tunis", "TN", &[]),
    ("Algiers", "DZ", &["Alger"]),
    ("Lagos", "NG", &[]),
    ("Abuja", "NG", &[]),
    ("Accra", "GH", &[]),
    ("Dakar", "SN", &[]),
    ("Abidjan", "CI", &[]),
    ("Nairobi", "KE", &[]),
    ("Addis Ababa", "ET", &[]),
    ("Kampala", "UG", &[]),
    ("Dar es Salaam", "TZ", &[]),
    ("Kinshasa", "CD", &[]),
    ("Luanda", "AO", &[]),
    ("Johannesburg", "ZA", &[]),
    ("Cape Town", "ZA", &[]),
    ("Durban", "ZA", &[]),
    ("Pretoria", "ZA", &[]),
    ("Dubai", "AE", &[]),
    ("Abu Dhabi", "AE", &[]),
    ("Doha", "QA", &[]),
    ("Riyadh", "SA", &[]),
    ("Jeddah", "SA", &[]),
    ("Tel Aviv", "IL", &[]),
    ("Jerusalem", "IL", &[]),
    ("Beirut", "LB", &[]),
    ("Amman", "JO", &[]),
    ("Tehran", "IR", &[]),
    ("Baghdad", "IQ", &[]),
    // Asia and Oceania
    ("Tokyo", "JP", &[]),
    ("Osaka", "JP", &[]),
    ("Kyoto", "JP", &[]),
    ("Yokohama", "JP", &[]),
    ("Seoul", "KR", &[]),
    ("Busan", "KR", &[]),
    ("Beijing", "CN", &["Peking"]),
    ("Shanghai", "CN", &[]),
    ("Shenzhen", "CN", &[]),
    ("Guangzhou", "CN", &[]),
    ("Chengdu", "CN", &[]),
    ("Taipei", "TW", &[]),
    ("Manila", "PH", &[]),
    ("Bangkok", "TH", &[]),
    ("Hanoi", "VN", &[]),
    ("Ho Chi Minh City", "VN", &["Saigon"]),
    ("Kuala Lumpur", "MY", &[]),
    ("Jakarta", "ID", &[]),
    ("Mumbai", "IN", &["Bombay"]),
    ("Delhi", "IN", &["New Delhi"]),
    ("Bangalore", "IN", &["Bengaluru"]),
    ("Chennai", "IN", &["Madras"]),
    ("Kolkata", "IN", &["Calcutta"]),
    ("Hyderabad", "IN", &[]),
    ("Karachi", "PK", &[]),
    ("Lahore", "PK", &[]),
    ("Dhaka", "BD", &[]),
    ("Kathmandu", "NP", &[]),
    ("Colombo", "LK", &[]),
    ("Almaty", "KZ", &[]),
    ("Tashkent", "UZ", &[]),
    ("Sydney", "AU", &[]),
    ("Melbourne", "AU", &[]),
    ("Brisbane", "AU", &[]),
    ("Perth", "AU", &[]),
    ("Adelaide", "AU", &[]),
    ("Auckland", "NZ", &[]),
    ("Wellington", "NZ", &[]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_city_points_at_a_known_country() {
        let gazetteer = Gazetteer::global();
        for (name, alpha2, _) in CITIES {
            assert!(
                gazetteer.country_by_code(alpha2).is_some(),
                "{} references unknown country code {}",
                name,
                alpha2
            );
        }
    }

    #[test]
    fn recognizes_country_and_city_in_order() {
        let matches = Gazetteer::global().recognize("Paris, France");
        assert_eq!(matches.countries.first().map(|c| c.name), Some("France"));
        assert_eq!(matches.cities.first().map(|c| c.name), Some("Paris"));
    }

    #[test]
    fn prefers_longest_name_at_a_position() {
        let matches = Gazetteer::global().recognize("Port Moresby, Papua New Guinea");
        assert_eq!(matches.countries.len(), 1);
        assert_eq!(matches.countries[0].alpha2, "PG");

        let matches = Gazetteer::global().recognize("new york");
        assert_eq!(matches.cities[0].name, "New York");
    }

    #[test]
    fn longer_city_name_claims_words_from_a_country() {
        let matches = Gazetteer::global().recognize("Mexico City");
        assert!(matches.countries.is_empty());
        assert_eq!(matches.cities.first().map(|c| c.name), Some("Mexico City"));

        let matches = Gazetteer::global().recognize("Mexico City, Mexico");
        assert_eq!(matches.cities.first().map(|c| c.name), Some("Mexico City"));
        assert_eq!(matches.countries.first().map(|c| c.name), Some("Mexico"));
    }

    #[test]
    fn every_country_name_recognizes_itself() {
        let gazetteer = Gazetteer::global();
        for (name, _, _) in COUNTRIES {
            let matches = gazetteer.recognize(name);
            assert_eq!(matches.countries.first().map(|c| c.name), Some(*name), "{}", name);
        }
    }

    #[test]
    fn aliases_map_to_canonical_country() {
        let gazetteer = Gazetteer::global();
        assert_eq!(gazetteer.country_by_name("usa").map(|c| c.name), Some("United States"));
        assert_eq!(gazetteer.country_by_name("Deutschland").map(|c| c.alpha2), Some("DE"));
        assert_eq!(gazetteer.country_by_name("  FRANCE ").map(|c| c.name), Some("France"));
        assert!(gazetteer.country_by_name("Atlantis").is_none());
    }

    #[test]
    fn lookup_by_code_is_case_insensitive() {
        assert_eq!(Gazetteer::global().country_by_code("fr").map(|c| c.name), Some("France"));
    }

    #[test]
    fn noise_matches_nothing() {
        let matches = Gazetteer::global().recognize("Unknownplace123");
        assert!(matches.countries.is_empty());
        assert!(matches.cities.is_empty());
        assert_eq!(Gazetteer::global().recognize(""), PlaceMatches::default());
    }
}
