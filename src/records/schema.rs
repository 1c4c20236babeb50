use crate::model::DocumentType;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    SourcePath,
    Number,
    Date,
    Excerpt,
}

/// One `Label: value` header line. `aliases` are accepted on read only, so a schema can
/// re-read files written with another vocabulary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LabeledField {
    pub kind: FieldKind,
    pub label: String,
    pub aliases: Vec<String>,
}

impl LabeledField {
    pub fn new(kind: FieldKind, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            aliases: Vec::new(),
        }
    }

    pub fn alias(mut self, label: &str) -> Self {
        self.aliases.push(label.to_string());
        self
    }

    pub fn accepts(&self, label: &str) -> bool {
        let wanted = label.trim().to_lowercase();
        std::iter::once(&self.label)
            .chain(self.aliases.iter())
            .any(|candidate| candidate.to_lowercase() == wanted)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextJoin {
    Newline,
    Space,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LabelSchema {
    pub name: String,
    pub document_type: DocumentType,
    pub fields: Vec<LabeledField>,
    /// Separator for unlabeled lines gathered into the free-text excerpt.
    pub text_join: TextJoin,
}

const NUMBER_LABELS: [&str; 4] = [
    "Número do Decreto",
    "Número da Lei",
    "Número da Portaria",
    "Número documento",
];
const DATE_LABELS: [&str; 2] = ["Data", "Data da Portaria"];

pub const PATH_LABEL: &str = "Arquivo";
pub const EXCERPT_LABEL: &str = "Trecho capturado";

impl LabelSchema {
    pub fn for_type(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Decree => {
                Self::labeled("decree", document_type, "Número do Decreto", "Data")
            }
            DocumentType::ComplementaryLaw => {
                Self::labeled("complementary_law", document_type, "Número da Lei", "Data")
            }
            DocumentType::Generic => {
                Self::labeled("generic", document_type, "Número documento", "Data")
            }
            DocumentType::Ordinance => Self {
                name: "ordinance".to_string(),
                document_type,
                fields: vec![
                    LabeledField::new(FieldKind::SourcePath, PATH_LABEL),
                    with_aliases(
                        LabeledField::new(FieldKind::Number, "Número da Portaria"),
                        &NUMBER_LABELS,
                    ),
                    with_aliases(
                        LabeledField::new(FieldKind::Date, "Data da Portaria"),
                        &DATE_LABELS,
                    ),
                ],
                text_join: TextJoin::Newline,
            },
        }
    }

    fn labeled(
        name: &str,
        document_type: DocumentType,
        number_label: &str,
        date_label: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            document_type,
            fields: vec![
                LabeledField::new(FieldKind::SourcePath, PATH_LABEL),
                with_aliases(
                    LabeledField::new(FieldKind::Number, number_label),
                    &NUMBER_LABELS,
                ),
                with_aliases(LabeledField::new(FieldKind::Date, date_label), &DATE_LABELS),
                LabeledField::new(FieldKind::Excerpt, EXCERPT_LABEL),
            ],
            text_join: TextJoin::Newline,
        }
    }

    pub fn with_text_join(mut self, text_join: TextJoin) -> Self {
        self.text_join = text_join;
        self
    }

    pub fn field(&self, kind: FieldKind) -> Option<&LabeledField> {
        self.fields.iter().find(|field| field.kind == kind)
    }

    /// `true` when the excerpt is written as a free-text body instead of a labeled line.
    pub fn excerpt_is_body(&self) -> bool {
        self.field(FieldKind::Excerpt).is_none()
    }

    pub fn classify(&self, label: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|field| field.accepts(label))
            .map(|field| field.kind)
    }
}

fn with_aliases(mut field: LabeledField, aliases: &[&str]) -> LabeledField {
    for alias in aliases {
        if *alias != field.label {
            field = field.alias(alias);
        }
    }
    field
}
