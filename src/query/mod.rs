//! Query request types (noun module)
//!
//! The declarative request a dashboard sends: projections, grouping,
//! ordering and filters over model tables.

mod request;

pub use request::{
    Aggregation, FilterOperator, FilterSpec, GroupKey, HierarchyPart, LogicalConnector, OrderKey,
    Projection, QueryRequest, SortDirection,
};
