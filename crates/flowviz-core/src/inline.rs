use crate::form::BlockForm;
use crate::render::{self, Element};
use crate::Block;

/// An inline editing session on one rendered block.
///
/// The block's markup is captured before the form replaces it so that a
/// cancel can put back exactly what was there.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineEdit {
    pub block_id: String,
    pub original_markup: String,
    pub form: BlockForm,
}

impl InlineEdit {
    pub fn begin(block: &Block) -> Self {
        let original = Element {
            children: render::block_content(block),
            ..Element::new("div")
        };
        Self {
            block_id: block.id.clone(),
            original_markup: original.inner_html(),
            form: BlockForm::from_block(block),
        }
    }

    /// The form as it will be submitted. The id always comes from the block
    /// under edit, whatever the form field says.
    pub fn submission(&self) -> BlockForm {
        BlockForm {
            id: self.block_id.clone(),
            ..self.form.clone()
        }
    }

    pub fn element(&self) -> Element {
        render::inline_form_element(&self.form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_markup_and_prefills() {
        let mut block = Block::bare("parse");
        block.title = "Parse".into();
        block.details.tasks = vec!["tokenise".into()];
        let edit = InlineEdit::begin(&block);
        assert!(edit.original_markup.contains("<h3>Parse</h3>"));
        assert!(edit.original_markup.contains("<li>tokenise</li>"));
        assert_eq!(edit.form.title, "Parse");
        assert!(edit.element().has_class("inline-edit-form"));
    }

    #[test]
    fn submission_pins_block_id() {
        let mut edit = InlineEdit::begin(&Block::bare("parse"));
        edit.form.id = "renamed".into();
        assert_eq!(edit.submission().id, "parse");
    }
}
