use octocrab::Error as OctocrabError;

#[derive(Debug)]
pub enum GitHubError {
    TokenNotFound(String),
    ApiError(OctocrabError),
    NotFound {
        resource: String,
    },
    MissingField {
        resource: String,
        field: &'static str,
    },
    /// A shared lookup failed for another caller; carries that failure's headline
    SharedFailure(String),
}

impl From<OctocrabError> for GitHubError {
    fn from(err: OctocrabError) -> Self {
        GitHubError::ApiError(err)
    }
}

impl GitHubError {
    pub fn is_not_found(err: &OctocrabError) -> bool {
        matches!(err, OctocrabError::GitHub { source, .. } if source.status_code.as_u16() == 404)
    }

    /// One-line description, suitable for per-branch warnings
    pub fn headline(&self) -> String {
        match self {
            GitHubError::TokenNotFound(msg) => format!("GitHub token missing: {msg}"),
            GitHubError::ApiError(OctocrabError::GitHub { source, .. }) => {
                format!("HTTP {}: {}", source.status_code, source.message)
            }
            GitHubError::ApiError(err) => format!("GitHub request failed: {err}"),
            GitHubError::NotFound { resource } => format!("Not found: {resource}"),
            GitHubError::MissingField { resource, field } => {
                format!("{resource} has no '{field}'")
            }
            GitHubError::SharedFailure(headline) => headline.clone(),
        }
    }
}

impl std::fmt::Display for GitHubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHubError::TokenNotFound(msg) => {
                writeln!(f, "GitHub Authentication Error")?;
                writeln!(f, "──────────────────────────")?;
                write!(f, "🔑 {msg}\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(f, "   → Export a token: export GITHUB_TOKEN=\"$(gh auth token)\"")?;
                writeln!(f, "   → Or add GITHUB_TOKEN=... to .env")?;
                write!(f, "   → Create token at: https://github.com/settings/tokens")
            }
            GitHubError::ApiError(octocrab_err) => {
                writeln!(f, "GitHub API Error")?;
                writeln!(f, "────────────────")?;
                match octocrab_err {
                    OctocrabError::GitHub { source, .. } => {
                        write!(f, "🌐 HTTP {}: {}\n\n", source.status_code, source.message)?;
                        match source.status_code.as_u16() {
                            401 => {
                                writeln!(f, "🔧 AUTHENTICATION FAILED:")?;
                                writeln!(f, "   → Token is invalid or expired")?;
                                write!(f, "   → Run: gh auth login")
                            }
                            403 | 429 => {
                                writeln!(f, "🔧 RATE LIMITED OR FORBIDDEN:")?;
                                writeln!(f, "   → Check rate limits: gh api rate_limit")?;
                                write!(f, "   → Lower github.rate_limit.requests_per_second")
                            }
                            _ => {
                                writeln!(f, "🔧 TROUBLESHOOTING:")?;
                                writeln!(f, "   → Check authentication: gh auth status")?;
                                write!(f, "   → Verify repository access: gh repo view")
                            }
                        }
                    }
                    _ => {
                        write!(f, "🌐 {octocrab_err}\n\n")?;
                        writeln!(f, "🔧 TROUBLESHOOTING:")?;
                        writeln!(f, "   → Test connection: curl -I https://api.github.com")?;
                        write!(f, "   → GitHub status: https://status.github.com")
                    }
                }
            }
            GitHubError::NotFound { .. }
            | GitHubError::MissingField { .. }
            | GitHubError::SharedFailure(_) => f.write_str(&self.headline()),
        }
    }
}

impl std::error::Error for GitHubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitHubError::ApiError(err) => Some(err),
            _ => None,
        }
    }
}
