// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use vetdesk_app::validation::{
    ValidationError, format_rut, is_valid_chile_phone, is_valid_email, normalize_chile_phone,
    validate_rut,
};
use vetdesk_dom::{Document, NodeId};

pub const VALID_CLASS: &str = "is-valid";
pub const INVALID_CLASS: &str = "is-invalid";
pub const FEEDBACK_CLASS: &str = "invalid-feedback";
pub const VALID_BORDER: &str = "#28a745";
pub const INVALID_BORDER: &str = "#dc3545";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Rut,
    Email,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Empty optional field.
    Neutral,
    Valid,
    Invalid(ValidationError),
}

/// Live formatting and blur-time validity markers for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFeedback {
    pub input_id: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldFeedback {
    pub fn new(input_id: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            input_id: input_id.to_owned(),
            kind,
            required,
        }
    }

    pub fn input(&self, doc: &Document) -> Option<NodeId> {
        doc.element_by_id(&self.input_id)
    }

    /// Keystroke handler: RUT fields are regrouped as the user types.
    pub fn on_input(&self, doc: &mut Document) {
        if self.kind != FieldKind::Rut {
            return;
        }
        let Some(input) = self.input(doc) else {
            return;
        };
        let raw = doc.value(input);
        if raw.is_empty() {
            return;
        }
        let formatted = format_rut(raw);
        doc.set_value(input, &formatted);
    }

    pub fn check(&self, value: &str) -> Validity {
        let value = value.trim();
        if value.is_empty() {
            return if self.required {
                Validity::Invalid(self.error())
            } else {
                Validity::Neutral
            };
        }
        let valid = match self.kind {
            FieldKind::Rut => validate_rut(value),
            FieldKind::Email => is_valid_email(value),
            FieldKind::Phone => is_valid_chile_phone(&normalize_chile_phone(value)),
        };
        if valid {
            Validity::Valid
        } else {
            Validity::Invalid(self.error())
        }
    }

    fn error(&self) -> ValidationError {
        match self.kind {
            FieldKind::Rut => ValidationError::InvalidRut,
            FieldKind::Email => ValidationError::InvalidEmail,
            FieldKind::Phone => ValidationError::InvalidPhone,
        }
    }

    /// Blur handler: validates and paints the field. Valid phone values are
    /// rewritten in canonical form; anything else is left as typed.
    pub fn on_blur(&self, doc: &mut Document) -> Validity {
        let Some(input) = self.input(doc) else {
            return Validity::Neutral;
        };
        if self.kind == FieldKind::Phone {
            let normalized = normalize_chile_phone(doc.value(input).trim());
            if is_valid_chile_phone(&normalized) {
                doc.set_value(input, &normalized);
            }
        }
        let validity = self.check(doc.value(input));
        paint(doc, input, &validity);
        validity
    }

    /// Removes every marker, e.g. when the form is reopened.
    pub fn clear(&self, doc: &mut Document) {
        if let Some(input) = self.input(doc) {
            paint(doc, input, &Validity::Neutral);
        }
    }
}

fn paint(doc: &mut Document, input: NodeId, validity: &Validity) {
    let feedback = feedback_element(doc, input);
    match validity {
        Validity::Neutral => {
            doc.remove_class(input, VALID_CLASS);
            doc.remove_class(input, INVALID_CLASS);
            doc.set_style(input, "border-color", "");
            doc.remove_attribute(input, "data-validity");
            if let Some(feedback) = feedback {
                doc.set_displayed(feedback, false);
            }
        }
        Validity::Valid => {
            doc.add_class(input, VALID_CLASS);
            doc.remove_class(input, INVALID_CLASS);
            doc.set_style(input, "border-color", VALID_BORDER);
            doc.remove_attribute(input, "data-validity");
            if let Some(feedback) = feedback {
                doc.set_displayed(feedback, false);
            }
        }
        Validity::Invalid(error) => {
            let message = error.field_message();
            doc.add_class(input, INVALID_CLASS);
            doc.remove_class(input, VALID_CLASS);
            doc.set_style(input, "border-color", INVALID_BORDER);
            doc.set_attribute(input, "data-validity", message);
            if let Some(feedback) = feedback {
                doc.set_text(feedback, message);
                doc.set_displayed(feedback, true);
            }
        }
    }
}

/// The input's `.invalid-feedback` sibling, else one inside its parent.
fn feedback_element(doc: &Document, input: NodeId) -> Option<NodeId> {
    if let Some(next) = doc.next_sibling(input)
        && doc.has_class(next, FEEDBACK_CLASS)
    {
        return Some(next);
    }
    let parent = doc.parent(input)?;
    doc.first_with_class(parent, FEEDBACK_CLASS)
}

#[cfg(test)]
mod tests {
    use super::{
        FEEDBACK_CLASS, FieldFeedback, FieldKind, INVALID_BORDER, INVALID_CLASS, VALID_CLASS,
        Validity,
    };
    use crate::markup;
    use vetdesk_app::validation::ValidationError;
    use vetdesk_dom::{Document, NodeId};

    fn field(doc: &mut Document, id: &str) -> (NodeId, NodeId) {
        let body = doc.body();
        let form = doc.build("form").append_to(body);
        let input = markup::form_field(doc, form, id, "Campo", "text");
        let feedback = doc
            .first_with_class(form, FEEDBACK_CLASS)
            .expect("feedback element");
        (input, feedback)
    }

    #[test]
    fn rut_is_reformatted_while_typing() {
        let mut doc = Document::new();
        let (input, _) = field(&mut doc, "cliente-rut");
        let feedback = FieldFeedback::new("cliente-rut", FieldKind::Rut, true);
        doc.set_value(input, "123456785");
        feedback.on_input(&mut doc);
        assert_eq!(doc.value(input), "12.345.678-5");
    }

    #[test]
    fn blur_marks_invalid_rut_and_shows_message() {
        let mut doc = Document::new();
        let (input, message) = field(&mut doc, "cliente-rut");
        let feedback = FieldFeedback::new("cliente-rut", FieldKind::Rut, true);
        doc.set_value(input, "12.345.678-9");

        let validity = feedback.on_blur(&mut doc);
        assert_eq!(validity, Validity::Invalid(ValidationError::InvalidRut));
        assert!(doc.has_class(input, INVALID_CLASS));
        assert_eq!(doc.style(input, "border-color"), Some(INVALID_BORDER));
        assert!(doc.attribute(input, "data-validity").is_some());
        assert!(doc.is_displayed(message));
        assert!(!doc.text(message).is_empty());

        doc.set_value(input, "12.345.678-5");
        assert_eq!(feedback.on_blur(&mut doc), Validity::Valid);
        assert!(doc.has_class(input, VALID_CLASS));
        assert!(!doc.has_class(input, INVALID_CLASS));
        assert!(!doc.is_displayed(message));
    }

    #[test]
    fn phone_is_normalized_on_blur() {
        let mut doc = Document::new();
        let (input, _) = field(&mut doc, "cliente-telefono");
        let feedback = FieldFeedback::new("cliente-telefono", FieldKind::Phone, false);
        doc.set_value(input, "9 1234 5678");
        assert_eq!(feedback.on_blur(&mut doc), Validity::Valid);
        assert_eq!(doc.value(input), "+56912345678");
    }

    #[test]
    fn invalid_phone_keeps_what_was_typed() {
        let mut doc = Document::new();
        let (input, message) = field(&mut doc, "cliente-telefono");
        let feedback = FieldFeedback::new("cliente-telefono", FieldKind::Phone, false);
        doc.set_value(input, "llamar tarde");
        assert_eq!(
            feedback.on_blur(&mut doc),
            Validity::Invalid(ValidationError::InvalidPhone)
        );
        assert_eq!(doc.value(input), "llamar tarde");
        assert!(doc.has_class(input, INVALID_CLASS));
        assert!(doc.is_displayed(message));
    }

    #[test]
    fn empty_optional_field_is_neutral_and_required_is_not() {
        let mut doc = Document::new();
        let (input, _) = field(&mut doc, "cliente-email");
        let optional = FieldFeedback::new("cliente-email", FieldKind::Email, false);
        assert_eq!(optional.on_blur(&mut doc), Validity::Neutral);
        assert!(!doc.has_class(input, INVALID_CLASS));

        let required = FieldFeedback::new("cliente-email", FieldKind::Email, true);
        assert!(matches!(required.on_blur(&mut doc), Validity::Invalid(_)));
        required.clear(&mut doc);
        assert!(!doc.has_class(input, INVALID_CLASS));
    }

    #[test]
    fn missing_input_is_neutral() {
        let mut doc = Document::new();
        let feedback = FieldFeedback::new("no-existe", FieldKind::Email, true);
        feedback.on_input(&mut doc);
        assert_eq!(feedback.on_blur(&mut doc), Validity::Neutral);
    }
}
