//! データモデル

mod instance;
mod port;
mod release;
mod scale;
mod value;

pub use instance::{Formation, Instance, Route};
pub use port::{PortSpec, merge_port_specs};
pub use release::{Release, ServiceDescriptor, latest_release, next_release_name};
pub use scale::{ScaleMap, parse_scale};
pub use value::{CommandSpec, deserialize_command, deserialize_env, deserialize_ports};
