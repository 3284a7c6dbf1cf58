//! Property-based tests for accessors and identity re-basing

use proptest::prelude::*;
use sbol_domain_graph::entities::{
    component_definition, identified, interaction, measurement, module_definition, participation,
};
use sbol_domain_graph::identity;
use sbol_domain_graph::{Config, Document};

fn display_id() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,10}"
}

proptest! {
    #[test]
    fn scalar_get_returns_what_was_set(name in "\\PC*") {
        let config = Config::default();
        let mut cd = component_definition::new(&config, "cd").unwrap();

        identified::NAME.set(&mut cd, name.clone()).unwrap();

        prop_assert_eq!(identified::NAME.get(&cd).unwrap(), Some(name));
    }

    #[test]
    fn list_get_keeps_insertion_order(roles in prop::collection::vec("[a-z]{1,8}", 0..6)) {
        let config = Config::default();
        let mut cd = component_definition::new(&config, "cd").unwrap();
        let uris: Vec<String> = roles.iter().map(|r| format!("http://examples.org/role/{r}")).collect();

        component_definition::ROLES.set(&mut cd, uris.clone()).unwrap();

        prop_assert_eq!(component_definition::ROLES.get(&cd).unwrap(), uris);
    }

    #[test]
    fn rebase_replaces_whole_prefix(
        old in display_id(),
        new in display_id(),
        rest in prop::collection::vec(display_id(), 1..5),
    ) {
        let old_prefix = format!("http://examples.org/ns#{old}");
        let new_prefix = format!("http://examples.org/ns#{new}");
        let path = rest.join("/");

        let rebased = identity::rebase(&format!("{old_prefix}/{path}"), &old_prefix, &new_prefix);

        prop_assert_eq!(rebased, Some(format!("{new_prefix}/{path}")));
    }

    #[test]
    fn rename_rebases_every_descendant(
        old in display_id(),
        new in display_id(),
        children in prop::collection::hash_set(display_id(), 1..4),
    ) {
        prop_assume!(old != new);
        let config = Config::default();
        let mut doc = Document::new(config.clone());
        let root = doc
            .add(module_definition::new(&config, &format!("http://examples.org/ns#{old}")).unwrap())
            .unwrap();
        for child in &children {
            let i = module_definition::INTERACTIONS
                .add(&mut doc, root, interaction::new(&config, child).unwrap())
                .unwrap();
            let p = interaction::PARTICIPATIONS
                .add(&mut doc, i, participation::new(&config, "p").unwrap())
                .unwrap();
            participation::MEASUREMENTS
                .add(&mut doc, p, measurement::new(&config, "m", 1.0, "http://examples.org/unit").unwrap())
                .unwrap();
        }
        let count = doc.len();

        doc.rename(root, &format!("http://examples.org/ns#{new}")).unwrap();

        prop_assert_eq!(doc.len(), count);
        for child in &children {
            let deepest = format!("http://examples.org/ns#{new}/{child}/p/m");
            prop_assert!(doc.contains(&deepest));
            let stale = format!("http://examples.org/ns#{old}/{child}/p/m");
            prop_assert!(!doc.contains(&stale));
        }
    }
}
