use std::collections::BTreeMap;

/// Kind of a package-level object in the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Func,
    Const,
    Var,
    TypeName,
}

/// Package scope: every top-level name and the kind of object it denotes
#[derive(Debug, Clone, Default)]
pub struct Scope {
    objects: BTreeMap<String, ObjectKind>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, returning the previous kind when it was already declared
    pub fn insert(&mut self, name: impl Into<String>, kind: ObjectKind) -> Option<ObjectKind> {
        self.objects.insert(name.into(), kind)
    }

    pub fn with(mut self, name: &str, kind: ObjectKind) -> Self {
        self.insert(name, kind);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<ObjectKind> {
        self.objects.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectKind)> {
        self.objects.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
