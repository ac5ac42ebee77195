// File: ./src/model.rs
// Records produced by the schedule parser: people on the roster and their duty days.
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single calendar day attributed to one person on the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DutyDate {
    /// Month name exactly as written in the calendar header.
    pub month: String,
    /// Day of month, or 0 when the calendar cell did not hold a number.
    pub day: i32,
    /// `YYYY-MM-DD`, always in the reference year.
    pub date: String,
}

/// One row of the roster table.
///
/// `colour` is the only link between the roster row and the calendar cells,
/// so it is expected to be unique across the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DutyPerson {
    pub current: bool,
    pub today: Option<DutyDate>,
    pub name: String,
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub slack: Option<String>,
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub slack_short: Option<String>,
    pub colour: String,
    #[serde(default)]
    pub duty: Vec<DutyDate>,
}

impl DutyPerson {
    pub fn email_or_blank(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }

    pub fn slack_short_or_blank(&self) -> &str {
        self.slack_short.as_deref().unwrap_or("")
    }

    /// Marks this person as on duty for `date`.
    pub(crate) fn set_current(&mut self, date: DutyDate) {
        self.current = true;
        self.today = Some(date);
    }

    pub(crate) fn clear_current(&mut self) {
        self.current = false;
        self.today = None;
    }
}

/// Returns the person currently on duty, if any.
pub fn find_current(roster: &[DutyPerson]) -> Option<&DutyPerson> {
    roster.iter().find(|p| p.current)
}

// The wire format predates optional fields and uses "" for "not set".
fn empty_if_none<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn none_if_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> DutyPerson {
        DutyPerson {
            name: "Alice".to_string(),
            email: Some("alice@x.com".to_string()),
            colour: "rgb(1,1,1)".to_string(),
            duty: vec![DutyDate {
                month: "January".to_string(),
                day: 15,
                date: "2024-01-15".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(alice()).unwrap();
        assert_eq!(json["Name"], "Alice");
        assert_eq!(json["Email"], "alice@x.com");
        assert_eq!(json["Slack"], "");
        assert_eq!(json["SlackShort"], "");
        assert_eq!(json["Colour"], "rgb(1,1,1)");
        assert_eq!(json["Current"], false);
        assert!(json["Today"].is_null());
        assert_eq!(json["Duty"][0]["Month"], "January");
        assert_eq!(json["Duty"][0]["Day"], 15);
        assert_eq!(json["Duty"][0]["Date"], "2024-01-15");
    }

    #[test]
    fn test_blank_strings_read_back_as_none() {
        let json = r#"{"Current":false,"Today":null,"Name":"Bob","Email":"","Slack":"","SlackShort":"","Colour":"highlight-red"}"#;
        let person: DutyPerson = serde_json::from_str(json).unwrap();
        assert_eq!(person.email, None);
        assert_eq!(person.slack_short, None);
        assert!(person.duty.is_empty());
    }

    #[test]
    fn test_find_current() {
        let mut bob = alice();
        bob.name = "Bob".to_string();
        bob.set_current(bob.duty[0].clone());
        let roster = vec![alice(), bob];
        assert_eq!(find_current(&roster).map(|p| p.name.as_str()), Some("Bob"));
        assert!(find_current(&roster[..1]).is_none());
    }
}
