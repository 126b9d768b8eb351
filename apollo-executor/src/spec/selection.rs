use apollo_compiler::ast;
use apollo_compiler::Name;
use apollo_compiler::Node;
use indexmap::map::Entry;
use indexmap::IndexMap;
use indexmap::IndexSet;

use super::Fragments;
use super::SpecError;
use crate::json_ext::literal_to_json;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::kinds::KindSet;

// The RECURSION_LIMIT is chosen to be:
//   < # expected to cause stack overflow &&
//   > # expected in a legitimate query
const RECURSION_LIMIT: usize = 512;

/// The fields requested at one level of an operation, by response key.
///
/// Repeated mentions of a response key are merged into a single [`Field`] and fragments are
/// expanded in place, so iteration order is the order in which each response key first
/// appears in the selection set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    fields: IndexMap<String, Field>,
}

/// One requested field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: Name,
    alias: Option<Name>,
    /// `None` when the field was selected outside of any type condition.
    on_kinds: Option<IndexSet<String>>,
    arguments: Arguments,
    selection: Option<Selection>,
}

/// Field arguments, as written in the document.
///
/// Values are raw literals: variables are not substituted and no coercion takes place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(IndexMap<String, Node<ast::Value>>);

impl Selection {
    /// Builds the selection of a selection set, expanding fragments from `fragments`.
    pub fn from_ast(
        selection_set: &[ast::Selection],
        fragments: &Fragments,
    ) -> Result<Self, SpecError> {
        Self::with_variables(selection_set, fragments, &Object::new())
    }

    /// Like [`Selection::from_ast`], evaluating `@skip` and `@include` conditions on variables.
    pub fn with_variables(
        selection_set: &[ast::Selection],
        fragments: &Fragments,
        variables: &Object,
    ) -> Result<Self, SpecError> {
        let builder = Builder {
            fragments,
            variables,
        };
        let mut selection = Selection::default();
        builder.merge(&mut selection, selection_set, None, 0)?;
        Ok(selection)
    }

    pub fn get(&self, response_key: &str) -> Option<&Field> {
        self.fields.get(response_key)
    }

    /// Response keys and their fields, in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(key, field)| (key.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Field {
    /// The underlying field name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_ref().map(|alias| alias.as_str())
    }

    pub fn response_key(&self) -> &str {
        self.alias().unwrap_or(self.name())
    }

    /// The type conditions the field was selected under, `None` if it applies to any kind.
    pub fn on_kinds(&self) -> Option<&IndexSet<String>> {
        self.on_kinds.as_ref()
    }

    /// Whether the field applies to an object with these capability tags.
    pub fn applies_to(&self, kinds: &KindSet) -> bool {
        match &self.on_kinds {
            None => true,
            Some(on_kinds) => kinds.intersects(on_kinds.iter().map(String::as_str)),
        }
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }
}

impl Arguments {
    fn from_ast(arguments: &[Node<ast::Argument>]) -> Self {
        Arguments(
            arguments
                .iter()
                .map(|argument| (argument.name.to_string(), argument.value.clone()))
                .collect(),
        )
    }

    /// The literal value of an argument.
    pub fn get(&self, name: &str) -> Option<&ast::Value> {
        self.0.get(name).map(|value| &**value)
    }

    /// The value of a string argument.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.as_str())
    }

    /// The value of an argument converted to JSON, `None` if absent or if it references a variable.
    pub fn get_json(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(literal_to_json)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ast::Value)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), &**value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct Builder<'a> {
    fragments: &'a Fragments,
    variables: &'a Object,
}

impl Builder<'_> {
    /// Merges a selection set into `selection`.
    ///
    /// `type_condition` is the condition of the nearest enclosing fragment declaring one. It does
    /// not carry over into the subselections of fields.
    fn merge(
        &self,
        selection: &mut Selection,
        selection_set: &[ast::Selection],
        type_condition: Option<&str>,
        depth: usize,
    ) -> Result<(), SpecError> {
        if depth > RECURSION_LIMIT {
            tracing::error!("selection processing recursion limit({RECURSION_LIMIT}) exceeded");
            return Err(SpecError::RecursionLimitExceeded);
        }
        for item in selection_set {
            match item {
                ast::Selection::Field(field) => {
                    if IncludeSkip::parse(&field.directives).should_skip(self.variables) {
                        continue;
                    }
                    self.merge_field(selection, field, type_condition, depth)?;
                }
                ast::Selection::FragmentSpread(spread) => {
                    if IncludeSkip::parse(&spread.directives).should_skip(self.variables) {
                        continue;
                    }
                    let fragment = self
                        .fragments
                        .get(spread.fragment_name.as_str())
                        .ok_or_else(|| {
                            SpecError::UnknownFragment(spread.fragment_name.to_string())
                        })?;
                    self.merge(
                        selection,
                        &fragment.selection_set,
                        Some(fragment.type_condition.as_str()),
                        depth + 1,
                    )?;
                }
                ast::Selection::InlineFragment(inline_fragment) => {
                    if IncludeSkip::parse(&inline_fragment.directives).should_skip(self.variables)
                    {
                        continue;
                    }
                    // No condition of its own: the enclosing fragment's condition still holds
                    let type_condition = inline_fragment
                        .type_condition
                        .as_ref()
                        .map(|name| name.as_str())
                        .or(type_condition);
                    self.merge(
                        selection,
                        &inline_fragment.selection_set,
                        type_condition,
                        depth + 1,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn merge_field(
        &self,
        selection: &mut Selection,
        field: &ast::Field,
        type_condition: Option<&str>,
        depth: usize,
    ) -> Result<(), SpecError> {
        let key = field.alias.as_ref().unwrap_or(&field.name).to_string();
        match selection.fields.entry(key.clone()) {
            Entry::Vacant(entry) => {
                let subselection = if field.selection_set.is_empty() {
                    None
                } else {
                    let mut subselection = Selection::default();
                    self.merge(&mut subselection, &field.selection_set, None, depth + 1)?;
                    Some(subselection)
                };
                entry.insert(Field {
                    name: field.name.clone(),
                    alias: field.alias.clone(),
                    on_kinds: type_condition.map(|kind| IndexSet::from([kind.to_string()])),
                    arguments: Arguments::from_ast(&field.arguments),
                    selection: subselection,
                });
            }
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if existing.name != field.name {
                    return Err(SpecError::ConflictingFields {
                        key,
                        existing: existing.name.to_string(),
                        new: field.name.to_string(),
                    });
                }
                if existing.arguments != Arguments::from_ast(&field.arguments) {
                    return Err(SpecError::ConflictingArguments { key });
                }
                // An unconditional mention makes the field apply to every kind
                existing.on_kinds = match (existing.on_kinds.take(), type_condition) {
                    (Some(mut kinds), Some(kind)) => {
                        kinds.insert(kind.to_string());
                        Some(kinds)
                    }
                    _ => None,
                };
                match (&mut existing.selection, field.selection_set.is_empty()) {
                    (Some(subselection), false) => {
                        self.merge(subselection, &field.selection_set, None, depth + 1)?
                    }
                    (None, true) => {}
                    _ => return Err(SpecError::AmbiguousMerge { key }),
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IncludeSkip {
    include: Condition,
    skip: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Yes,
    No,
    Variable(String),
}

impl IncludeSkip {
    fn parse(directives: &ast::DirectiveList) -> Self {
        let mut include = None;
        let mut skip = None;
        for directive in &directives.0 {
            if include.is_none() && directive.name.as_str() == "include" {
                include = Condition::parse(directive)
            }
            if skip.is_none() && directive.name.as_str() == "skip" {
                skip = Condition::parse(directive)
            }
        }
        Self {
            include: include.unwrap_or(Condition::Yes),
            skip: skip.unwrap_or(Condition::No),
        }
    }

    fn should_skip(&self, variables: &Object) -> bool {
        // A condition on a missing variable falls back to the directive's default
        self.skip.eval(variables).unwrap_or(false) || !self.include.eval(variables).unwrap_or(true)
    }
}

impl Condition {
    fn parse(directive: &ast::Directive) -> Option<Self> {
        let argument = directive
            .arguments
            .iter()
            .find(|argument| argument.name.as_str() == "if")?;
        match &*argument.value {
            ast::Value::Boolean(true) => Some(Condition::Yes),
            ast::Value::Boolean(false) => Some(Condition::No),
            ast::Value::Variable(variable) => {
                Some(Condition::Variable(variable.as_str().to_owned()))
            }
            _ => None,
        }
    }

    fn eval(&self, variables: &Object) -> Option<bool> {
        match self {
            Condition::Yes => Some(true),
            Condition::No => Some(false),
            Condition::Variable(variable_name) => variables
                .get(variable_name.as_str())
                .and_then(|v| v.as_bool()),
        }
    }
}
