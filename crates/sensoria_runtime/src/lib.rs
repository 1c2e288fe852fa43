pub mod capability;
pub mod connector;
pub mod model_select;
pub mod providers;
pub mod scheduler;

pub use capability::{CapabilityDescriptor, CapabilityRegistry};
pub use connector::{Connector, ConnectorConfig, HttpConnector};
pub use model_select::{select_model, ModelChoice};
pub use providers::{HttpTextClassifier, HttpTts, MockStt, MockTts};
pub use scheduler::WorkPool;
