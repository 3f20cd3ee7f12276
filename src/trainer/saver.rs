//! Writes the predictions and the learned factors.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::engine::ProgramGraph;
use crate::graph::VertexId;
use crate::prelude::*;
use crate::trainer::context::Hyperparameters;
use crate::trainer::loader::remap_target_id;
use crate::trainer::math::predict;
use crate::trainer::model::VertexData;
use crate::trainer::program::BiasSgd;

/// Formats one `source\ttarget\tprediction` line per edge.
pub fn format_predictions(
    graph: &ProgramGraph<BiasSgd>,
    hyperparameters: &Hyperparameters,
    remap_target: bool,
) -> Result<String> {
    let mut output = String::new();
    for edge in graph.edges() {
        let (source, target) = (edge.source(), edge.target());
        let target_id = if remap_target {
            remap_target_id(target.id())
        } else {
            target.id()
        };
        let prediction = predict(hyperparameters, source.data(), target.data());
        writeln!(output, "{}\t{}\t{}", source.id(), target_id, prediction)?;
    }
    Ok(output)
}

#[instrument(skip_all, fields(path = %path.display()))]
pub async fn save_predictions(
    graph: &ProgramGraph<BiasSgd>,
    hyperparameters: &Hyperparameters,
    remap_target: bool,
    path: &Path,
) -> Result {
    let output = format_predictions(graph, hyperparameters, remap_target)?;
    tokio::fs::write(path, output)
        .await
        .with_context(|| format!("failed to write `{}`", path.display()))?;
    info!(n_edges = graph.num_edges(), "saved the predictions");
    Ok(())
}

#[derive(Serialize)]
struct FactorsRecord<'a> {
    id: VertexId,

    #[serde(flatten)]
    data: &'a VertexData,
}

/// Formats the vertices as JSON lines.
pub fn format_factors(graph: &ProgramGraph<BiasSgd>) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    for vertex in graph.vertices() {
        let record = FactorsRecord {
            id: vertex.id(),
            data: vertex.data(),
        };
        serde_json::to_writer(&mut output, &record)?;
        output.push(b'\n');
    }
    Ok(output)
}

#[instrument(skip_all, fields(path = %path.display()))]
pub async fn save_factors(graph: &ProgramGraph<BiasSgd>, path: &Path) -> Result {
    let output = format_factors(graph)?;
    tokio::fs::write(path, output)
        .await
        .with_context(|| format!("failed to write `{}`", path.display()))?;
    info!(n_vertices = graph.num_vertices(), "saved the factors");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::graph::GraphBuilder;
    use crate::trainer::model::{EdgeData, Role};

    fn build_graph(remap_target: bool) -> ProgramGraph<BiasSgd> {
        let target = if remap_target {
            remap_target_id(7)
        } else {
            7
        };
        let mut builder = GraphBuilder::default();
        builder.add_edge(3, target, EdgeData::new(0.0, Role::Predict));
        builder.build(|id| {
            let mut data = VertexData::new(vec![1.0, 2.0]);
            data.bias = if id == 3 { 0.5 } else { -0.25 };
            data
        })
    }

    #[test]
    fn format_predictions_ok() -> Result {
        let hyperparameters = Hyperparameters {
            global_mean: 1.0,
            min_value: 0.0,
            max_value: 10.0,
            ..Default::default()
        };
        let output = format_predictions(&build_graph(true), &hyperparameters, true)?;
        assert_eq!(output, "3\t7\t6.25\n");
        Ok(())
    }

    #[test]
    fn format_factors_ok() -> Result {
        let output = format_factors(&build_graph(false))?;
        let records = std::str::from_utf8(&output)?
            .lines()
            .map(serde_json::from_str)
            .collect::<StdResult<Vec<Value>, _>>()?;
        assert_eq!(
            records,
            [
                json!({"id": 3, "n_updates": 0, "bias": 0.5, "factors": [1.0, 2.0]}),
                json!({"id": 7, "n_updates": 0, "bias": -0.25, "factors": [1.0, 2.0]}),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn save_predictions_ok() -> Result {
        let path =
            std::env::temp_dir().join(format!("bias-sgd-predictions-{}", std::process::id()));
        let hyperparameters = Hyperparameters {
            max_value: 10.0,
            ..Default::default()
        };
        save_predictions(&build_graph(false), &hyperparameters, false, &path).await?;
        let content = tokio::fs::read_to_string(&path).await?;
        tokio::fs::remove_file(&path).await?;
        assert_eq!(content, "3\t7\t5.25\n");
        Ok(())
    }
}
