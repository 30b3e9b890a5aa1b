use serde::{Deserialize, Serialize};

/// A single conscript record as returned by the upstream list endpoint.
///
/// Every field is a string on the wire, including `pos` and `bdate`, and is
/// kept that way: upstream does not guarantee numeric-clean values.
/// Missing fields deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(default)]
pub struct Person {
    pub pos: String,
    pub number: String,
    pub name: String,
    pub lastname: String,
    pub bdate: String,
    pub department: String,
    pub info: String,
}

impl Person {
    /// Case-insensitive match on names, raw substring match on number and birth year.
    ///
    /// `needle_lower` must already be lowercased.
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.lastname.to_lowercase().contains(needle_lower)
            || self.number.contains(needle_lower)
            || self.bdate.contains(needle_lower)
    }

    pub fn born_in(&self, year: &str) -> bool {
        self.bdate == year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, lastname: &str, number: &str, bdate: &str) -> Person {
        Person {
            name: name.to_string(),
            lastname: lastname.to_string(),
            number: number.to_string(),
            bdate: bdate.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{"pos":"17","number":"LT-0042","name":"Jonas","lastname":"Jonaitis",
            "bdate":"2004","department":"Vilniaus RKP","info":"atidėta"}"#;
        let p: Person = serde_json::from_str(json).unwrap();
        assert_eq!(p.pos, "17");
        assert_eq!(p.number, "LT-0042");
        assert_eq!(p.department, "Vilniaus RKP");
        assert_eq!(p.info, "atidėta");
    }

    #[test]
    fn test_deserialize_missing_fields_default_empty() {
        let p: Person = serde_json::from_str(r#"{"name":"Ona"}"#).unwrap();
        assert_eq!(p.name, "Ona");
        assert_eq!(p.lastname, "");
        assert_eq!(p.bdate, "");
    }

    #[test]
    fn test_serialize_exposes_all_fields() {
        let value = serde_json::to_value(person("Jonas", "Jonaitis", "A1", "1990")).unwrap();
        for key in ["pos", "number", "name", "lastname", "bdate", "department", "info"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_matches_names_case_insensitive() {
        let p = person("Jonas", "SMITHSON", "A1", "1990");
        assert!(p.matches("smith"));
        assert!(p.matches("jon"));
        assert!(!p.matches("petr"));
    }

    #[test]
    fn test_matches_number_and_year_raw() {
        let p = person("Jonas", "Jonaitis", "AB12", "1990");
        assert!(p.matches("1990"));
        assert!(p.matches("99"));
        // number is compared as-is, the needle is already lowercase
        assert!(!p.matches("ab12"));
        assert!(p.matches("12"));
    }

    #[test]
    fn test_born_in_exact() {
        let p = person("Jonas", "Jonaitis", "A1", "1990");
        assert!(p.born_in("1990"));
        assert!(!p.born_in("199"));
    }
}
