use serde::{Deserialize, Serialize};

/// Row index of a document in a matrix; rows follow corpus insertion order.
pub type DocId = u32;

/// Text fields a matrix can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Description,
    Keywords,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Keywords => "keywords",
        }
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Field::Title),
            "description" | "abstract" => Ok(Field::Description),
            "keywords" => Ok(Field::Keywords),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub external_id: String,
    /// Language tag as delivered by the record source; blank means "use the default".
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Document {
    pub fn field(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Description => self.description.clone(),
            Field::Keywords => self.keywords.join(" "),
        }
    }

    /// Concatenation of `fields`, separated by single spaces.
    pub fn text(&self, fields: &[Field]) -> String {
        fields
            .iter()
            .map(|f| self.field(*f))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn meta(&self) -> DocMeta {
        DocMeta { external_id: self.external_id.clone(), title: self.title.clone() }
    }
}

/// What a query result points back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: String,
}

/// A snapshot of a document collection.
///
/// `id` and `modified` identify the snapshot; together with the matrix shape
/// they determine the build hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub id: String,
    pub modified: String,
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn new(id: impl Into<String>, modified: impl Into<String>) -> Self {
        Self { id: id.into(), modified: modified.into(), documents: Vec::new() }
    }

    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
