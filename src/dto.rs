use serde::{Deserialize, Serialize};

use crate::Tokens;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Spend tokens on a story.
    Generate,
    /// Purchase tokens.
    Buy,
}

/// One user action, as read from the input CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Request {
    pub action: ActionType,
    pub user: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub plot_twist: String,
}

/// Final state of one account, as written to the output CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRow {
    pub user: String,
    pub tokens: Tokens,
    pub stories: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_csv_row(row: &str) -> Result<Request, csv::Error> {
        let data_with_header = format!("action,user,character,setting,plot_twist\n{}", row);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data_with_header.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn test_parse_generate() {
        assert_eq!(
            parse_csv_row("generate,alice,a knight,a castle,a storm").unwrap(),
            Request {
                action: ActionType::Generate,
                user: "alice".into(),
                character: "a knight".into(),
                setting: "a castle".into(),
                plot_twist: "a storm".into(),
            }
        );
    }

    #[test]
    fn test_parse_buy_with_empty_fields() {
        assert_eq!(
            parse_csv_row("buy, bob ,,,").unwrap(),
            Request {
                action: ActionType::Buy,
                user: "bob".into(),
                character: String::new(),
                setting: String::new(),
                plot_twist: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_quoted_commas() {
        let request =
            parse_csv_row(r#"generate,alice,"a knight, old and tired",a castle,a storm"#).unwrap();
        assert_eq!(request.character, "a knight, old and tired");
    }

    #[test]
    fn test_parse_invalid_action() {
        assert!(parse_csv_row("refund,alice,,,").is_err());
    }

    #[test]
    fn test_account_row_header() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(AccountRow {
            user: "alice".into(),
            tokens: 50,
            stories: 1,
        })
        .unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "user,tokens,stories\nalice,50,1\n");
    }
}
