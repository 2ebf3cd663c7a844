use crate::errors::ValidationError;
use crate::links::PASSWORD_PARAM;
use crate::query::QueryPairs;

/// Login button states: the first press reveals the password field, the
/// second one submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginStage {
    #[default]
    Collapsed,
    Revealed,
}

impl LoginStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::Revealed => "revealed",
        }
    }

    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("revealed") => Self::Revealed,
            _ => Self::Collapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Reveal,
    Rejected(ValidationError),
    Navigate(String),
}

/// Handles one press of the login button and returns the next stage.
pub fn press(stage: LoginStage, username: &str, password: &str) -> (LoginStage, LoginOutcome) {
    let username = username.trim();
    if username.is_empty() {
        return (stage, LoginOutcome::Rejected(ValidationError::MissingUsername));
    }

    match stage {
        LoginStage::Collapsed => (LoginStage::Revealed, LoginOutcome::Reveal),
        LoginStage::Revealed if password.trim().is_empty() => (
            LoginStage::Revealed,
            LoginOutcome::Rejected(ValidationError::MissingPassword),
        ),
        LoginStage::Revealed => (
            LoginStage::Revealed,
            LoginOutcome::Navigate(authorization_url(username, password)),
        ),
    }
}

fn authorization_url(username: &str, password: &str) -> String {
    let mut query = QueryPairs::default();
    query.set("username", username);
    query.set(PASSWORD_PARAM, password);
    format!("/auth?{}", query.encode())
}
