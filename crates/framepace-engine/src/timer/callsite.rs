use std::fmt;

/// Which original timer call invoked the scheduler.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CallsiteId {
    #[default]
    Unknown,
    Gameplay,
    Frontend,
    Menu,
}

impl CallsiteId {
    /// Number of slots, `Unknown` included.
    pub const COUNT: usize = 4;

    /// The call sites that can carry custom timing.
    pub const RESOLVABLE: [CallsiteId; 3] = [CallsiteId::Gameplay, CallsiteId::Frontend, CallsiteId::Menu];

    pub fn name(self) -> &'static str {
        match self {
            CallsiteId::Unknown => "Unknown",
            CallsiteId::Gameplay => "Gameplay",
            CallsiteId::Frontend => "Frontend",
            CallsiteId::Menu => "Menu",
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CallsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque call-origin handle supplied by the hook layer (typically a return address).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CallsiteToken(pub usize);

/// Token → call-site table, filled once when hooks are installed.
///
/// Sites that could not be located stay unset and resolve to `Unknown`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CallsiteMap {
    gameplay: Option<CallsiteToken>,
    frontend: Option<CallsiteToken>,
    menu: Option<CallsiteToken>,
}

impl CallsiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gameplay(mut self, token: CallsiteToken) -> Self {
        self.gameplay = Some(token);
        self
    }

    pub fn with_frontend(mut self, token: CallsiteToken) -> Self {
        self.frontend = Some(token);
        self
    }

    pub fn with_menu(mut self, token: CallsiteToken) -> Self {
        self.menu = Some(token);
        self
    }

    pub fn token(&self, site: CallsiteId) -> Option<CallsiteToken> {
        match site {
            CallsiteId::Gameplay => self.gameplay,
            CallsiteId::Frontend => self.frontend,
            CallsiteId::Menu => self.menu,
            CallsiteId::Unknown => None,
        }
    }

    pub fn is_resolved(&self, site: CallsiteId) -> bool {
        self.token(site).is_some()
    }

    pub fn resolve(&self, token: CallsiteToken) -> CallsiteId {
        CallsiteId::RESOLVABLE
            .into_iter()
            .find(|&site| self.token(site) == Some(token))
            .unwrap_or(CallsiteId::Unknown)
    }
}
