//! Transport-neutral outgoing messages.

/// What should happen to the operator's reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever keyboard is currently shown.
    Keep,
    /// Replace it with these rows of button labels.
    Show(Vec<Vec<String>>),
    /// Take the keyboard away.
    Remove,
}

/// One message to deliver to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Keep,
        }
    }

    /// A prompt with a keyboard.
    pub fn menu(text: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Show(rows),
        }
    }

    /// A menu with one button per row.
    pub fn column(text: impl Into<String>, labels: impl IntoIterator<Item = String>) -> Self {
        Self::menu(text, labels.into_iter().map(|label| vec![label]).collect())
    }

    pub fn clearing(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Remove,
        }
    }

    /// Button labels in display order, if this message carries a keyboard.
    pub fn labels(&self) -> Vec<&str> {
        match &self.keyboard {
            Keyboard::Show(rows) => rows.iter().flatten().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}
