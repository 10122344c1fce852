//! Paste-JSON modal.

use crate::editor::FlowEditor;
use crate::import::{self, ImportError};
use crate::render::Element;
use crate::Flow;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonModal {
    open: bool,
    pub text: String,
    error: Option<String>,
    valid: bool,
}

impl JsonModal {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Open the modal. Clipboard text that looks like JSON replaces the
    /// current text and is validated straight away; anything else is ignored.
    pub fn open(&mut self, clipboard: Option<&str>) {
        self.open = true;
        if let Some(clip) = clipboard {
            let trimmed = clip.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                self.text = clip.to_string();
                let _ = self.validate();
            }
        }
    }

    /// Hide the modal and its error. The text is kept so the user can come
    /// back to it.
    pub fn close(&mut self) {
        self.open = false;
        self.error = None;
    }

    pub fn validate(&mut self) -> Result<Flow, ImportError> {
        let result = import::parse_flow(&self.text);
        match &result {
            Ok(_) => {
                self.error = None;
                self.valid = true;
            }
            Err(e) => {
                self.error = Some(format!("Error: {e}"));
                self.valid = false;
            }
        }
        result
    }

    /// Validate and load into the editor, closing on success. A failed
    /// validation leaves both the modal and the editor as they were.
    pub fn load_into(&mut self, editor: &mut FlowEditor) -> Result<(), ImportError> {
        let flow = self.validate()?;
        editor.load(flow);
        self.close();
        Ok(())
    }

    pub fn element(&self) -> Element {
        let mut input = Element::new("textarea").id("json-input").text(self.text.clone());
        if self.error.is_some() {
            input.add_class("invalid");
        } else if self.valid {
            input.add_class("valid");
        }
        let mut modal = Element::new("div")
            .id("json-modal")
            .class("modal")
            .child(Element::new("h3").text("Paste JSON"))
            .child(input);
        if let Some(error) = &self.error {
            modal.push(Element::new("div").id("json-error").text(error.clone()));
        }
        if self.open {
            modal.add_class("open");
        }
        modal
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const FLOW: &str = r#"{"title":"t","blocks":[{"id":"a"}],"connections":[]}"#;

    #[test]
    fn clipboard_json_is_prefilled_and_validated() {
        let mut modal = JsonModal::default();
        modal.open(Some(&format!("  {FLOW}")));
        assert!(modal.is_open());
        assert!(modal.is_valid());
        assert!(modal.text.contains("\"blocks\""));
    }

    #[test]
    fn clipboard_prose_is_ignored() {
        let mut modal = JsonModal {
            text: "draft".into(),
            ..Default::default()
        };
        modal.open(Some("hello"));
        assert_eq!(modal.text, "draft");
        assert!(!modal.is_valid());
    }

    #[test]
    fn empty_text_reports_error() {
        let mut modal = JsonModal::default();
        modal.open(None);
        assert_matches!(modal.validate(), Err(ImportError::Empty));
        assert_eq!(modal.error(), Some("Error: JSON cannot be empty"));
        assert!(modal.element().find_by_id("json-error").is_some());
    }

    #[test]
    fn close_keeps_text() {
        let mut modal = JsonModal::default();
        modal.open(None);
        modal.text = "{".into();
        assert!(modal.validate().is_err());
        modal.close();
        assert_eq!(modal.text, "{");
        assert_eq!(modal.error(), None);
    }

    #[test]
    fn load_replaces_flow_and_closes() {
        let mut editor = FlowEditor::new(Flow::default());
        let mut modal = JsonModal::default();
        modal.open(None);
        modal.text = r#"{"blocks":[]}"#.into();
        assert_matches!(modal.load_into(&mut editor), Err(ImportError::MissingArray("connections")));
        assert!(modal.is_open());
        assert_eq!(editor.flow().title, "New data flow");

        modal.text = FLOW.into();
        modal.load_into(&mut editor).unwrap();
        assert!(!modal.is_open());
        assert_eq!(editor.flow().blocks.len(), 1);
    }
}
