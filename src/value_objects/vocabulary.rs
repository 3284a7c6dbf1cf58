//! Vocabulary URIs used by the SBOL 2 data model

// RDF / XSD
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

// Namespaces
pub const SBOL_NS: &str = "http://sbols.org/v2#";
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
pub const PROV_NS: &str = "http://www.w3.org/ns/prov#";
pub const OM_NS: &str = "http://www.ontology-of-units-of-measure.org/resource/om-2/";

/// Prefixes every document can resolve (`sbol:mergeRoles`)
pub const STANDARD_PREFIXES: [(&str, &str); 4] = [
    ("sbol", SBOL_NS),
    ("dcterms", DCTERMS_NS),
    ("prov", PROV_NS),
    ("om", OM_NS),
];

// Identified
pub const SBOL_IDENTIFIED: &str = "http://sbols.org/v2#Identified";
pub const SBOL_TOP_LEVEL: &str = "http://sbols.org/v2#TopLevel";
pub const SBOL_DISPLAY_ID: &str = "http://sbols.org/v2#displayId";
pub const SBOL_PERSISTENT_IDENTITY: &str = "http://sbols.org/v2#persistentIdentity";
pub const SBOL_VERSION: &str = "http://sbols.org/v2#version";
pub const DCTERMS_TITLE: &str = "http://purl.org/dc/terms/title";
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
pub const PROV_WAS_DERIVED_FROM: &str = "http://www.w3.org/ns/prov#wasDerivedFrom";

// Classes
pub const SBOL_COMPONENT_DEFINITION: &str = "http://sbols.org/v2#ComponentDefinition";
pub const SBOL_COMPONENT: &str = "http://sbols.org/v2#Component";
pub const SBOL_MODULE_DEFINITION: &str = "http://sbols.org/v2#ModuleDefinition";
pub const SBOL_FUNCTIONAL_COMPONENT: &str = "http://sbols.org/v2#FunctionalComponent";
pub const SBOL_COMPONENT_INSTANCE: &str = "http://sbols.org/v2#ComponentInstance";
pub const SBOL_INTERACTION: &str = "http://sbols.org/v2#Interaction";
pub const SBOL_PARTICIPATION: &str = "http://sbols.org/v2#Participation";
pub const OM_MEASURE: &str = "http://www.ontology-of-units-of-measure.org/resource/om-2/Measure";

// Properties
pub const SBOL_TYPES: &str = "http://sbols.org/v2#type";
pub const SBOL_ROLES: &str = "http://sbols.org/v2#role";
pub const SBOL_ROLE_INTEGRATION: &str = "http://sbols.org/v2#roleIntegration";
pub const SBOL_DEFINITION: &str = "http://sbols.org/v2#definition";
pub const SBOL_ACCESS: &str = "http://sbols.org/v2#access";
pub const SBOL_DIRECTION: &str = "http://sbols.org/v2#direction";
pub const SBOL_PARTICIPANT: &str = "http://sbols.org/v2#participant";
pub const SBOL_COMPONENTS: &str = "http://sbols.org/v2#component";
pub const SBOL_FUNCTIONAL_COMPONENTS: &str = "http://sbols.org/v2#functionalComponent";
pub const SBOL_INTERACTIONS: &str = "http://sbols.org/v2#interaction";
pub const SBOL_PARTICIPATIONS: &str = "http://sbols.org/v2#participation";
pub const SBOL_MEASUREMENTS: &str = "http://sbols.org/v2#measure";
pub const OM_HAS_NUMERICAL_VALUE: &str =
    "http://www.ontology-of-units-of-measure.org/resource/om-2/hasNumericalValue";
pub const OM_HAS_UNIT: &str = "http://www.ontology-of-units-of-measure.org/resource/om-2/hasUnit";

// Controlled values
pub const SBOL_ROLE_INTEGRATION_MERGE: &str = "http://sbols.org/v2#mergeRoles";
pub const SBOL_ROLE_INTEGRATION_OVERRIDE: &str = "http://sbols.org/v2#overrideRoles";
pub const SBOL_ACCESS_PUBLIC: &str = "http://sbols.org/v2#public";
pub const SBOL_ACCESS_PRIVATE: &str = "http://sbols.org/v2#private";
pub const SBOL_DIRECTION_IN: &str = "http://sbols.org/v2#in";
pub const SBOL_DIRECTION_OUT: &str = "http://sbols.org/v2#out";
pub const SBOL_DIRECTION_IN_OUT: &str = "http://sbols.org/v2#inout";
pub const SBOL_DIRECTION_NONE: &str = "http://sbols.org/v2#none";

pub const BIOPAX_DNA: &str = "http://www.biopax.org/release/biopax-level3.owl#DnaRegion";
pub const BIOPAX_PROTEIN: &str = "http://www.biopax.org/release/biopax-level3.owl#Protein";

pub const SO_PROMOTER: &str = "http://identifiers.org/so/SO:0000167";
pub const SO_CDS: &str = "http://identifiers.org/so/SO:0000316";
pub const SO_TERMINATOR: &str = "http://identifiers.org/so/SO:0000141";

pub const SBO_INTERACTION: &str = "http://identifiers.org/biomodels.sbo/SBO:0000231";
pub const SBO_INHIBITION: &str = "http://identifiers.org/biomodels.sbo/SBO:0000169";
pub const SBO_INHIBITOR: &str = "http://identifiers.org/biomodels.sbo/SBO:0000020";
pub const SBO_INHIBITED: &str = "http://identifiers.org/biomodels.sbo/SBO:0000642";
