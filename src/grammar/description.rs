//! Grammar identity
//!
//! A DTD grammar is identified by the public and system identifiers of its
//! external subset, plus the root element named in the DOCTYPE.

/// Public/system identifiers of an external resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIdentifier {
    pub public_id: Option<String>,
    pub literal_system_id: Option<String>,
    pub base_system_id: Option<String>,
}

impl ResourceIdentifier {
    pub fn system(system_id: &str) -> Self {
        ResourceIdentifier {
            literal_system_id: Some(system_id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_public_id(mut self, public_id: &str) -> Self {
        self.public_id = Some(public_id.to_string());
        self
    }

    pub fn with_base(mut self, base_system_id: &str) -> Self {
        self.base_system_id = Some(base_system_id.to_string());
        self
    }

    /// Resolve the literal system id against the base.
    ///
    /// Absolute ids (with a scheme or a leading '/') are returned as is;
    /// relative ones replace the last path segment of the base.
    pub fn expanded_system_id(&self) -> Option<String> {
        let literal = self.literal_system_id.as_deref()?;
        let is_absolute = literal.starts_with('/') || literal.contains("://");
        match self.base_system_id.as_deref() {
            Some(base) if !is_absolute => {
                let dir = match base.rfind('/') {
                    Some(slash) => &base[..=slash],
                    None => "",
                };
                Some(format!("{dir}{literal}"))
            }
            _ => Some(literal.to_string()),
        }
    }
}

/// Key under which a grammar can be cached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrammarKey {
    System(String),
    Public(String),
}

/// Identity and root information of one DTD grammar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarDescription {
    pub id: ResourceIdentifier,
    /// Root element named in the DOCTYPE, if any
    pub root_name: Option<String>,
    /// Every declared element when no root name was given
    pub possible_roots: Vec<String>,
}

impl GrammarDescription {
    pub fn new(root_name: Option<&str>, id: ResourceIdentifier) -> Self {
        GrammarDescription {
            id,
            root_name: root_name.map(str::to_string),
            possible_roots: Vec::new(),
        }
    }

    /// System id takes precedence; a grammar with neither id is not cacheable
    pub fn key(&self) -> Option<GrammarKey> {
        if let Some(system) = self.id.expanded_system_id() {
            return Some(GrammarKey::System(system));
        }
        self.id.public_id.clone().map(GrammarKey::Public)
    }

    /// True if `name` may be the document element under this grammar
    pub fn accepts_root(&self, name: &str) -> bool {
        match &self.root_name {
            Some(root) => root == name,
            None => self.possible_roots.iter().any(|r| r == name),
        }
    }
}
