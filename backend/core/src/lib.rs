//! `docfill-core`: the placeholder model behind docfill.
//!
//! Extraction of `${name}` placeholders, the ordered field registry with
//! dependency checks, visibility and requiredness evaluation, form
//! validation, and final document generation.

pub mod document;
pub mod enrichment;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod generator;
pub mod placeholder;
pub mod registry;
pub mod session;
pub mod template;
pub mod validator;
pub mod value;

pub use document::{load_document, write_document, Document};
pub use enrichment::{EnrichmentService, SuggestedPlaceholder};
pub use error::{DocfillError, Result};
pub use evaluator::{field_states, is_effectively_required, is_truthy, is_visible, FieldState};
pub use field::{FieldConfig, FieldKind};
pub use generator::{substitute, Generated, GenerationPolicy, GenerationWarning, Generator, Proceed};
pub use placeholder::{extract, extract_str, PlaceholderName};
pub use registry::Registry;
pub use session::FormSession;
pub use template::Template;
pub use validator::{validate, ValidationReport};
pub use value::{FieldValue, ValueMap};
