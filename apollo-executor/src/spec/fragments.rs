use std::collections::HashMap;

use apollo_compiler::ast;
use apollo_compiler::Node;

use super::SpecError;

/// The named fragments of a document, by name.
#[derive(Debug, Default, Clone)]
pub struct Fragments {
    map: HashMap<String, Node<ast::FragmentDefinition>>,
}

impl Fragments {
    pub fn from_ast(document: &ast::Document) -> Result<Self, SpecError> {
        let mut map = HashMap::new();
        for definition in &document.definitions {
            if let ast::Definition::FragmentDefinition(fragment) = definition {
                let name = fragment.name.to_string();
                if map.insert(name.clone(), fragment.clone()).is_some() {
                    return Err(SpecError::DuplicateFragment(name));
                }
            }
        }
        Ok(Fragments { map })
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&Node<ast::FragmentDefinition>> {
        self.map.get(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_named_fragments() {
        let document = ast::Document::parse(
            "query { ...A } fragment A on Dog { name } fragment B on Cat { lives }",
            "query.graphql",
        )
        .unwrap();
        let fragments = Fragments::from_ast(&document).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments.get("A").unwrap().type_condition.as_str(), "Dog");
        assert_eq!(fragments.get("B").unwrap().type_condition.as_str(), "Cat");
        assert!(fragments.get("C").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let document = ast::Document::parse(
            "fragment A on Dog { name } fragment A on Cat { lives }",
            "query.graphql",
        )
        .unwrap();
        assert_eq!(
            Fragments::from_ast(&document).unwrap_err(),
            SpecError::DuplicateFragment("A".to_string())
        );
    }
}
