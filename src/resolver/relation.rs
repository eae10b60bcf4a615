//! The relation table: which attribute names become which link relations.

/// A link relation the server knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    ProfilePage,
    Avatar,
    OpenIdIssuer,
    Tailscale,
    GitHub,
    Mastodon,
}

impl Relation {
    /// Every relation, in the order links appear in a full document.
    pub const ALL: [Relation; 6] = [
        Relation::ProfilePage,
        Relation::Avatar,
        Relation::OpenIdIssuer,
        Relation::Tailscale,
        Relation::GitHub,
        Relation::Mastodon,
    ];

    /// Attribute name in the resource file.
    pub fn attribute(self) -> &'static str {
        match self {
            Relation::ProfilePage => "profile",
            Relation::Avatar => "avatar",
            Relation::OpenIdIssuer => "openid",
            Relation::Tailscale => "tailscale",
            Relation::GitHub => "github",
            Relation::Mastodon => "mastodon",
        }
    }

    /// Relation URI emitted as `rel`.
    pub fn uri(self) -> &'static str {
        match self {
            Relation::ProfilePage => "http://webfinger.net/rel/profile-page",
            Relation::Avatar => "http://webfinger.net/rel/avatar",
            Relation::OpenIdIssuer => "http://openid.net/specs/connect/1.0/issuer",
            Relation::Tailscale => "https://tailscale.com/rel",
            Relation::GitHub => "https://github.com",
            Relation::Mastodon => "https://mastodon.social",
        }
    }

    /// Exact match on the relation URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.uri() == uri)
    }

    /// Exact match on the attribute name.
    pub fn from_attribute(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.attribute() == name)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}
