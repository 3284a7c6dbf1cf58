//! Accessors for the properties every entity inherits from Identified

use crate::property::{List, Scalar, TextValue, UriValue};
use crate::value_objects::vocabulary::*;

pub const DISPLAY_ID: Scalar<TextValue> = Scalar::new(SBOL_DISPLAY_ID);
pub const PERSISTENT_IDENTITY: Scalar<UriValue> = Scalar::new(SBOL_PERSISTENT_IDENTITY);
pub const VERSION: Scalar<TextValue> = Scalar::new(SBOL_VERSION);
pub const NAME: Scalar<TextValue> = Scalar::new(DCTERMS_TITLE);
pub const DESCRIPTION: Scalar<TextValue> = Scalar::new(DCTERMS_DESCRIPTION);
pub const WAS_DERIVED_FROM: List<UriValue> = List::new(PROV_WAS_DERIVED_FROM);
