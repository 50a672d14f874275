use thiserror::Error;

pub type Result<T> = std::result::Result<T, BriefError>;

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("tool `{name}` failed: {source}")]
    Tool {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("tool `{0}` is not available to this agent")]
    UnknownTool(String),

    #[error("language model error: {0}")]
    Model(String),

    #[error("agent used {rounds} tool rounds without reaching a final answer")]
    RoundLimit { rounds: usize },

    #[error("invalid task ordering: {0}")]
    DependencyOrder(String),

    #[error("task `{task}` failed: {source}")]
    Task {
        task: String,
        #[source]
        source: Box<BriefError>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
