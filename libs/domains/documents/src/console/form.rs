use std::str::FromStr;

use super::Console;
use crate::models::DocumentEntry;

/// Button pressed on the console page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Add,
    Query,
    Clear,
    ConfirmClear,
    CancelClear,
    AddRow,
    RemoveRow(usize),
    ResetRows,
}

impl FromStr for FormAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(FormAction::Add),
            "query" => Ok(FormAction::Query),
            "clear" => Ok(FormAction::Clear),
            "confirm_clear" => Ok(FormAction::ConfirmClear),
            "cancel_clear" => Ok(FormAction::CancelClear),
            "add_row" => Ok(FormAction::AddRow),
            "reset_rows" => Ok(FormAction::ResetRows),
            other => other
                .strip_prefix("remove_row:")
                .and_then(|index| index.parse().ok())
                .map(FormAction::RemoveRow)
                .ok_or_else(|| format!("unknown console action '{other}'")),
        }
    }
}

/// Submitted console form.
///
/// Rows travel as repeated `document` / `metadata` fields in page order; a
/// `document` field starts a new row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleForm {
    pub rows: Vec<DocumentEntry>,
    pub query: String,
    pub confirming_clear: bool,
    pub action: Option<FormAction>,
}

impl ConsoleForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = ConsoleForm::default();

        for (key, value) in pairs {
            match key.as_str() {
                "document" => form.rows.push(DocumentEntry::new(value, "")),
                "metadata" => match form.rows.last_mut() {
                    Some(row) => row.metadata = value,
                    None => form.rows.push(DocumentEntry::new("", value)),
                },
                "query" => form.query = value,
                "phase" => form.confirming_clear = value == "confirming_clear",
                "action" => match value.parse() {
                    Ok(action) => form.action = Some(action),
                    Err(err) => tracing::debug!(error = %err, "Ignoring console action"),
                },
                _ => {}
            }
        }

        form
    }

    pub fn into_console(self) -> (Console, Option<FormAction>) {
        let action = self.action;
        let console = Console::restore(self.rows, self.query, self.confirming_clear);
        (console, action)
    }
}
