//! Infrastructure services

mod query_service;

pub use query_service::{
    ANALYSIS_FAILURE_RESPONSE, AnalysisRequest, AnalysisResponse, ERROR_RESPONSE,
    INCOMPLETE_RESPONSE, QueryFailure, QueryRequest, QueryResponse, QueryService,
    QueryServiceConfig, ResponsePreferences, TIMEOUT_RESPONSE,
};
