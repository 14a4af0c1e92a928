//! Indicator dependency graph and execution ordering.
//!
//! Each indicator is a node that writes its own columns. A node may read the
//! columns of the nodes it depends on (Bollinger reads the SMA middle band), so
//! nodes run in topological order of the dependency graph.

use std::collections::HashMap;

use insights_core::{Column, Series, SeriesError};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rust_decimal::Decimal;
use tracing::warn;

use crate::atr::{atr_columns, ATR_COLUMN, TR_COLUMN};
use crate::bollinger::{bollinger_columns, LOWER_COLUMN, UPPER_COLUMN};
use crate::config::IndicatorConfig;
use crate::ema::ema_column_name;
use crate::error::PlanError;
use crate::macd::{macd_columns, HISTOGRAM_COLUMN, MACD_COLUMN, SIGNAL_COLUMN};
use crate::rsi::{rsi_column, RSI_COLUMN};
use crate::sma::{sma_column, sma_column_name};
use crate::stddev::std_column_name;

/// One column-producing indicator in a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorNode {
    Rsi { period: usize },
    Atr { period: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Sma { period: usize },
    Bollinger { period: usize, k: Decimal },
}

impl IndicatorNode {
    /// Stable identifier used for dependency declarations.
    pub fn id(&self) -> String {
        match self {
            IndicatorNode::Rsi { .. } => "rsi".to_string(),
            IndicatorNode::Atr { .. } => "atr".to_string(),
            IndicatorNode::Macd { .. } => "macd".to_string(),
            IndicatorNode::Sma { period } => format!("sma_{}", period),
            IndicatorNode::Bollinger { .. } => "bollinger".to_string(),
        }
    }

    /// Nodes whose columns this node reads.
    pub fn dependencies(&self) -> Vec<String> {
        match self {
            IndicatorNode::Bollinger { period, .. } => {
                vec![IndicatorNode::Sma { period: *period }.id()]
            }
            _ => Vec::new(),
        }
    }

    /// Names of the columns this node writes.
    pub fn output_columns(&self) -> Vec<String> {
        match self {
            IndicatorNode::Rsi { .. } => vec![RSI_COLUMN.to_string()],
            IndicatorNode::Atr { .. } => vec![TR_COLUMN.to_string(), ATR_COLUMN.to_string()],
            IndicatorNode::Macd { fast, slow, .. } => vec![
                ema_column_name(*fast),
                ema_column_name(*slow),
                MACD_COLUMN.to_string(),
                SIGNAL_COLUMN.to_string(),
                HISTOGRAM_COLUMN.to_string(),
            ],
            IndicatorNode::Sma { period } => vec![sma_column_name(*period)],
            IndicatorNode::Bollinger { period, .. } => vec![
                std_column_name(*period),
                UPPER_COLUMN.to_string(),
                LOWER_COLUMN.to_string(),
            ],
        }
    }

    /// Compute this node's columns from the raw bars and its dependencies' columns.
    pub fn compute(&self, series: &Series) -> Result<Vec<(String, Column)>, SeriesError> {
        let outputs = match self {
            IndicatorNode::Rsi { period } => {
                vec![(RSI_COLUMN.to_string(), rsi_column(&series.closes(), *period))]
            }
            IndicatorNode::Atr { period } => {
                let cols = atr_columns(series.bars(), *period);
                vec![
                    (TR_COLUMN.to_string(), cols.true_range),
                    (ATR_COLUMN.to_string(), cols.atr),
                ]
            }
            IndicatorNode::Macd { fast, slow, signal } => {
                let cols = macd_columns(&series.closes(), *fast, *slow, *signal);
                vec![
                    (ema_column_name(*fast), cols.fast_ema),
                    (ema_column_name(*slow), cols.slow_ema),
                    (MACD_COLUMN.to_string(), cols.macd),
                    (SIGNAL_COLUMN.to_string(), cols.signal),
                    (HISTOGRAM_COLUMN.to_string(), cols.histogram),
                ]
            }
            IndicatorNode::Sma { period } => {
                vec![(sma_column_name(*period), sma_column(&series.closes(), *period))]
            }
            IndicatorNode::Bollinger { period, k } => {
                let middle = series.get_column(&sma_column_name(*period))?;
                let cols = bollinger_columns(&series.closes(), middle, *period, *k);
                vec![
                    (std_column_name(*period), cols.std_dev),
                    (UPPER_COLUMN.to_string(), cols.upper),
                    (LOWER_COLUMN.to_string(), cols.lower),
                ]
            }
        };
        Ok(outputs)
    }
}

/// Builder for the indicator dependency graph.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    graph: DiGraph<IndicatorNode, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// Extra (node, dependency) edges declared on top of each node's own.
    extra_edges: Vec<(String, String)>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Ids must be unique.
    pub fn add(&mut self, node: IndicatorNode) -> Result<&mut Self, PlanError> {
        let id = node.id();
        if self.node_indices.contains_key(&id) {
            return Err(PlanError::DuplicateNode(id));
        }
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        Ok(self)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Declare that `node` reads columns written by `dependency`.
    pub fn depend(&mut self, node: impl Into<String>, dependency: impl Into<String>) -> &mut Self {
        self.extra_edges.push((node.into(), dependency.into()));
        self
    }

    /// Resolve dependencies and sort the nodes into execution order.
    pub fn build(mut self) -> Result<ExecutionPlan, PlanError> {
        let mut edges = Vec::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            for dep in node.dependencies() {
                edges.push((node.id(), dep));
            }
        }
        edges.append(&mut self.extra_edges);

        for (node, dependency) in edges {
            let to = self.lookup(&node, &node)?;
            let from = self.lookup(&node, &dependency)?;
            self.graph.update_edge(from, to, ());
        }

        let order = toposort(&self.graph, None)
            .map_err(|cycle| PlanError::CyclicDependency(self.graph[cycle.node_id()].id()))?;

        Ok(ExecutionPlan {
            nodes: order.into_iter().map(|idx| self.graph[idx].clone()).collect(),
        })
    }

    fn lookup(&self, node: &str, id: &str) -> Result<NodeIndex, PlanError> {
        self.node_indices
            .get(id)
            .copied()
            .ok_or_else(|| PlanError::MissingDependency {
                node: node.to_string(),
                dependency: id.to_string(),
            })
    }
}

/// Nodes in an order where every dependency precedes its dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    nodes: Vec<IndicatorNode>,
}

impl ExecutionPlan {
    /// The standard plan for a config: RSI, ATR, MACD, one SMA per period and
    /// Bollinger Bands. The SMA Bollinger reads is added if the config omits it.
    pub fn from_config(config: &IndicatorConfig) -> Result<Self, PlanError> {
        let mut builder = PlanBuilder::new();
        builder
            .add(IndicatorNode::Rsi {
                period: config.rsi_period,
            })?
            .add(IndicatorNode::Atr {
                period: config.atr_period,
            })?
            .add(IndicatorNode::Macd {
                fast: config.macd_fast,
                slow: config.macd_slow,
                signal: config.macd_signal,
            })?;
        for period in &config.sma_periods {
            builder.add(IndicatorNode::Sma { period: *period })?;
        }

        let middle = IndicatorNode::Sma {
            period: config.bollinger_period,
        };
        if !builder.contains(&middle.id()) {
            warn!(
                period = config.bollinger_period,
                "Bollinger period not among SMA periods, adding it"
            );
            builder.add(middle)?;
        }
        builder.add(IndicatorNode::Bollinger {
            period: config.bollinger_period,
            k: config.bollinger_k,
        })?;

        builder.build()
    }

    pub fn nodes(&self) -> &[IndicatorNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every column the plan writes, in execution order.
    pub fn output_columns(&self) -> Vec<String> {
        self.nodes.iter().flat_map(IndicatorNode::output_columns).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn position(plan: &ExecutionPlan, id: &str) -> usize {
        plan.nodes().iter().position(|n| n.id() == id).unwrap()
    }

    #[test]
    fn test_default_plan_orders_sma_before_bollinger() {
        let plan = ExecutionPlan::from_config(&IndicatorConfig::default()).unwrap();
        assert_eq!(plan.len(), 8);
        assert!(position(&plan, "sma_20") < position(&plan, "bollinger"));
    }

    #[test]
    fn test_plan_adds_missing_bollinger_sma() {
        let config = IndicatorConfig {
            sma_periods: BTreeSet::from([5, 10]),
            bollinger_period: 15,
            ..Default::default()
        };
        let plan = ExecutionPlan::from_config(&config).unwrap();
        assert!(position(&plan, "sma_15") < position(&plan, "bollinger"));
        assert!(plan.output_columns().contains(&"SMA_15".to_string()));
    }

    #[test]
    fn test_output_columns_are_unique() {
        let plan = ExecutionPlan::from_config(&IndicatorConfig::default()).unwrap();
        let columns = plan.output_columns();
        let unique: BTreeSet<&String> = columns.iter().collect();
        assert_eq!(unique.len(), columns.len());
        for name in ["RSI", "TR", "ATR", "EMA_12", "EMA_26", "MACD", "Signal_Line",
                     "MACD_Histogram", "SMA_5", "SMA_10", "SMA_20", "SMA_30", "STD_20",
                     "Bollinger_Upper", "Bollinger_Lower"] {
            assert!(columns.contains(&name.to_string()), "missing {}", name);
        }
    }

    #[test]
    fn test_missing_dependency() {
        let mut builder = PlanBuilder::new();
        builder
            .add(IndicatorNode::Bollinger { period: 20, k: dec!(2) })
            .unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            PlanError::MissingDependency {
                node: "bollinger".into(),
                dependency: "sma_20".into(),
            }
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut builder = PlanBuilder::new();
        builder
            .add(IndicatorNode::Sma { period: 20 })
            .unwrap()
            .add(IndicatorNode::Bollinger { period: 20, k: dec!(2) })
            .unwrap();
        builder.depend("sma_20", "bollinger");
        assert!(matches!(builder.build(), Err(PlanError::CyclicDependency(_))));
    }

    #[test]
    fn test_duplicate_node() {
        let mut builder = PlanBuilder::new();
        builder.add(IndicatorNode::Rsi { period: 14 }).unwrap();
        let err = builder.add(IndicatorNode::Rsi { period: 7 }).unwrap_err();
        assert_eq!(err, PlanError::DuplicateNode("rsi".into()));
    }
}
