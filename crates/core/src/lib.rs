pub mod params;
pub mod request;

pub use params::{ParamTable, TestParameter};
pub use request::{
    DiagnosticsRequest, DiagnosticsTest, RequestData, ResponseFormat, UnknownTest,
    RUN_DIAGNOSTICS_ACTION,
};
