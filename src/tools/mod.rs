pub mod descriptor;
pub mod toolbox;

pub use descriptor::{all_descriptors, FunctionDescriptor, ToolDescriptor, ToolName, ALL_TOOLS};
pub use toolbox::{SearchArgs, TimeArgs, Toolbox, WeatherArgs};
