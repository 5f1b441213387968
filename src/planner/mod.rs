//! Query planning.
//!
//! This module turns a parsed SELECT into a logical plan and then into a
//! tree of executable operators.

mod analyser;
mod builder;
mod error;
mod logical;
mod physical;
mod where_classifier;

pub use analyser::{AggCall, QueryAnalyser, QueryAnalysis};
pub use builder::{PlanBuilder, QueryPlan};
pub use error::{PlanError, PlanResult};
pub use logical::{LogicalPlan, OrderKey};
pub use physical::PhysicalPlanner;
pub use where_classifier::{conjoin, referenced_tables, WhereClassifier};
