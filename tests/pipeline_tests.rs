//! Integration tests for building and running pipelines

mod common;

use common::{advanced_persons, numbers, rec, recs};
use graphflow::pipeline::StageChain;
use graphflow::record::{from_pairs, Record};
use graphflow::stage::{Source, Stage};
use graphflow::{GraphError, JoinStrategy, Pipeline, PipelineBuilder, RunOptions};
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

fn docs_words() -> Vec<Record> {
    recs(json!([
        {"doc_id": 1, "word": "a"},
        {"doc_id": 1, "word": "a"},
        {"doc_id": 1, "word": "b"},
        {"doc_id": 1, "word": "c"},
        {"doc_id": 2, "word": "a"},
        {"doc_id": 2, "word": "a"},
        {"doc_id": 2, "word": "a"},
        {"doc_id": 2, "word": "d"},
        {"doc_id": 3, "word": "x"},
        {"doc_id": 3, "word": "y"},
        {"doc_id": 3, "word": "y"},
    ]))
}

fn ndjson_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn test_source_only_pipeline_returns_its_records() {
    let pipeline = PipelineBuilder::from_records(numbers()).build().unwrap();
    assert_eq!(*pipeline.run().unwrap(), numbers());
}

#[test]
fn test_empty_source_yields_empty_output() {
    let pipeline = PipelineBuilder::from_records(Vec::new())
        .sort("a")
        .reduce("a", |rows: &[Record]| Ok(vec![rows[0].clone()]))
        .build()
        .unwrap();
    assert!(pipeline.run().unwrap().is_empty());
}

#[test]
fn test_map_filters_records() {
    let pipeline = PipelineBuilder::from_records(advanced_persons())
        .map(|r: &Record| {
            if r["id"].as_i64().unwrap_or(0) < 3 {
                Ok(vec![r.clone()])
            } else {
                Ok(Vec::new())
            }
        })
        .build()
        .unwrap();

    let names: Vec<_> = pipeline
        .run()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Andrey", "Leonid", "Sergey", "Misha", "Roma", "Rishat"]
    );
}

#[test]
fn test_map_can_expand_records() {
    let pipeline = PipelineBuilder::from_records(numbers())
        .map(|r: &Record| {
            let a = r["a"].as_i64().unwrap_or(0);
            Ok(vec![
                from_pairs([("a", json!(a))]),
                from_pairs([("a", json!(a * a))]),
            ])
        })
        .build()
        .unwrap();

    let values: Vec<i64> = pipeline
        .run()
        .unwrap()
        .iter()
        .map(|r| r["a"].as_i64().unwrap())
        .collect();
    assert_eq!(values, vec![1, 1, 2, 4, 3, 9, 4, 16, 5, 25]);
}

#[test]
fn test_fold_with_alternating_sign() {
    let pipeline = PipelineBuilder::from_records(numbers())
        .fold(from_pairs([("sum", json!(0))]), |state: Record, r: &Record| {
            let sum = state["sum"].as_i64().unwrap_or(0);
            let a = r["a"].as_i64().unwrap_or(0);
            let signed = if a % 2 == 0 { -a } else { a };
            Ok(from_pairs([("sum", json!(sum + signed))]))
        })
        .build()
        .unwrap();

    assert_eq!(*pipeline.run().unwrap(), vec![rec(json!({"sum": 3}))]);
}

#[test]
fn test_fold_concatenates_names() {
    let pipeline = PipelineBuilder::from_records(advanced_persons())
        .fold(from_pairs([("names", json!(""))]), |state: Record, r: &Record| {
            let names = state["names"].as_str().unwrap_or_default();
            let name = r["name"].as_str().unwrap_or_default();
            Ok(from_pairs([("names", json!(format!("{names}{name}")))]))
        })
        .build()
        .unwrap();

    assert_eq!(
        pipeline.run().unwrap()[0]["names"],
        json!("AndreyLeonidSergeyGrigoroyMishaRomaRishatMaximStepan")
    );
}

#[test]
fn test_fold_over_empty_input_yields_initial_state() {
    let pipeline = PipelineBuilder::from_records(Vec::new())
        .fold(from_pairs([("count", json!(0))]), |_: Record, _: &Record| {
            Ok(from_pairs([("count", json!(1))]))
        })
        .build()
        .unwrap();
    assert_eq!(*pipeline.run().unwrap(), vec![rec(json!({"count": 0}))]);
}

#[test]
fn test_sort_reverses_descending_input() {
    let mut reversed = numbers();
    reversed.reverse();
    let pipeline = PipelineBuilder::from_records(reversed)
        .sort("a")
        .build()
        .unwrap();
    assert_eq!(*pipeline.run().unwrap(), numbers());
}

#[test]
fn test_sort_by_two_keys_is_stable() {
    let pipeline = PipelineBuilder::from_records(advanced_persons())
        .sort(["age", "name"])
        .build()
        .unwrap();
    let ages: Vec<i64> = pipeline
        .run()
        .unwrap()
        .iter()
        .map(|r| r["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, vec![5, 10, 14, 17, 20, 25, 28, 38, 64]);

    let by_id = PipelineBuilder::from_records(advanced_persons())
        .sort("id")
        .build()
        .unwrap();
    let names: Vec<_> = by_id
        .run()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    // ties keep their input order
    assert_eq!(
        names,
        vec!["Andrey", "Sergey", "Misha", "Roma", "Leonid", "Rishat", "Grigoroy", "Maxim", "Stepan"]
    );
}

#[test]
fn test_sort_by_spec_with_descending_key() {
    let pipeline = PipelineBuilder::from_records(advanced_persons())
        .sort_by_spec("id, age DESC")
        .build()
        .unwrap();
    let names: Vec<_> = pipeline
        .run()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Andrey", "Sergey", "Roma", "Misha", "Leonid", "Rishat", "Grigoroy", "Maxim", "Stepan"]
    );
}

#[test]
fn test_sort_on_missing_field_fails_at_run() {
    let pipeline = PipelineBuilder::from_records(advanced_persons())
        .sort("height")
        .build()
        .unwrap();
    assert!(matches!(
        pipeline.run(),
        Err(GraphError::MissingField { field }) if field == "height"
    ));
    assert!(!pipeline.is_computed());
}

#[test]
fn test_word_reducer_counts_per_document() {
    let pipeline = PipelineBuilder::from_records(docs_words())
        .reduce("doc_id", |rows: &[Record]| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for row in rows {
                *counts
                    .entry(row["word"].as_str().unwrap_or_default().to_string())
                    .or_default() += 1;
            }
            let doc_id = rows[0]["doc_id"].clone();
            Ok(counts
                .into_iter()
                .map(|(word, count)| {
                    from_pairs([
                        ("doc_id", doc_id.clone()),
                        ("word", json!(word)),
                        ("count", json!(count)),
                    ])
                })
                .collect())
        })
        .build()
        .unwrap();

    assert_eq!(
        *pipeline.run().unwrap(),
        recs(json!([
            {"doc_id": 1, "word": "a", "count": 2},
            {"doc_id": 1, "word": "b", "count": 1},
            {"doc_id": 1, "word": "c", "count": 1},
            {"doc_id": 2, "word": "a", "count": 3},
            {"doc_id": 2, "word": "d", "count": 1},
            {"doc_id": 3, "word": "x", "count": 1},
            {"doc_id": 3, "word": "y", "count": 2},
        ]))
    );
}

#[test]
fn test_unique_reducer_keeps_first_of_each_group() {
    let pipeline = PipelineBuilder::from_records(docs_words())
        .reduce(["doc_id", "word"], |rows: &[Record]| Ok(vec![rows[0].clone()]))
        .build()
        .unwrap();

    assert_eq!(
        *pipeline.run().unwrap(),
        recs(json!([
            {"doc_id": 1, "word": "a"},
            {"doc_id": 1, "word": "b"},
            {"doc_id": 1, "word": "c"},
            {"doc_id": 2, "word": "a"},
            {"doc_id": 2, "word": "d"},
            {"doc_id": 3, "word": "x"},
            {"doc_id": 3, "word": "y"},
        ]))
    );
}

#[test]
fn test_sum_reducer_over_composite_key() {
    let input = recs(json!([
        {"id": 1, "word": "a", "value": 1},
        {"id": 1, "word": "b", "value": 2},
        {"id": 2, "word": "b", "value": 3},
        {"id": 2, "word": "b", "value": 4},
        {"id": 2, "word": "b", "value": 5},
        {"id": 3, "word": "c", "value": 6},
        {"id": 4, "word": "c", "value": 7},
        {"id": 4, "word": "d", "value": 1},
        {"id": 4, "word": "d", "value": 4},
        {"id": 5, "word": "d", "value": -4},
    ]));
    let pipeline = PipelineBuilder::from_records(input)
        .reduce(["id", "word"], |rows: &[Record]| {
            let sum: i64 = rows.iter().filter_map(|r| r["value"].as_i64()).sum();
            Ok(vec![from_pairs([
                ("id", rows[0]["id"].clone()),
                ("word", rows[0]["word"].clone()),
                ("sum", json!(sum)),
            ])])
        })
        .build()
        .unwrap();

    let sums: Vec<i64> = pipeline
        .run()
        .unwrap()
        .iter()
        .map(|r| r["sum"].as_i64().unwrap())
        .collect();
    assert_eq!(sums, vec![1, 2, 12, 6, 7, 5, -4]);
}

#[test]
fn test_callback_failure_carries_stage_label() {
    let exploder = Stage::map(|_: &Record| -> anyhow::Result<Vec<Record>> {
        anyhow::bail!("boom")
    })
    .named("exploder");
    let pipeline = PipelineBuilder::from_records(numbers())
        .then(exploder)
        .build()
        .unwrap();

    match pipeline.run() {
        Err(GraphError::Operation { stage, source }) => {
            assert!(stage.contains("exploder"));
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("expected an operation error, got {other:?}"),
    }
}

#[test]
fn test_execution_order_lists_dependencies_first() {
    let first = PipelineBuilder::from_records(numbers())
        .name("first")
        .build()
        .unwrap();
    let second = PipelineBuilder::from_pipeline(&first)
        .name("second")
        .build()
        .unwrap();
    let third = PipelineBuilder::from_pipeline(&second)
        .name("third")
        .build()
        .unwrap();

    let order: Vec<_> = third.execution_order().iter().map(Pipeline::label).collect();
    assert_eq!(order, vec!["first", "second"]);
    assert_eq!(*third.run().unwrap(), numbers());
    assert!(first.is_computed() && second.is_computed());
}

#[test]
fn test_diamond_computes_shared_dependency_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let shared = PipelineBuilder::from_records(advanced_persons())
        .name("shared")
        .map(move |r: &Record| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![r.clone()])
        })
        .build()
        .unwrap();
    let ages = PipelineBuilder::from_pipeline(&shared)
        .name("ages")
        .sort("age")
        .build()
        .unwrap();
    let names = PipelineBuilder::from_pipeline(&shared)
        .name("names")
        .sort("name")
        .build()
        .unwrap();
    let top = PipelineBuilder::from_pipeline(&ages)
        .join(&names, ["id", "name", "age"], JoinStrategy::Inner)
        .build()
        .unwrap();

    let order: Vec<_> = top.execution_order().iter().map(Pipeline::label).collect();
    assert_eq!(order.iter().filter(|l| *l == "shared").count(), 1);
    assert_eq!(order.last().map(String::as_str), Some("names"));

    assert_eq!(top.run().unwrap().len(), 9);
    assert_eq!(calls.load(Ordering::SeqCst), 9);
}

#[test]
fn test_rerun_is_idempotent() {
    let pipeline = PipelineBuilder::from_records(docs_words())
        .sort("word")
        .reduce("word", |rows: &[Record]| {
            Ok(vec![from_pairs([
                ("word", rows[0]["word"].clone()),
                ("count", json!(rows.len())),
            ])])
        })
        .build()
        .unwrap();

    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
}

#[test]
fn test_file_source_reads_ndjson() {
    let file = ndjson_file(&[r#"{"a": 2}"#, "", r#"{"a": 1}"#]);
    let pipeline = PipelineBuilder::from_file(file.path())
        .sort("a")
        .build()
        .unwrap();
    assert_eq!(
        *pipeline.run().unwrap(),
        vec![rec(json!({"a": 1})), rec(json!({"a": 2}))]
    );
}

#[test]
fn test_malformed_line_reports_line_number() {
    let file = ndjson_file(&[r#"{"a": 1}"#, r#"{"a": "#]);
    let pipeline = PipelineBuilder::from_file(file.path()).build().unwrap();
    match pipeline.run() {
        Err(GraphError::MalformedRecord { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a malformed record error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let pipeline = PipelineBuilder::from_file(dir.path().join("absent.jsonl"))
        .build()
        .unwrap();
    assert!(matches!(pipeline.run(), Err(GraphError::Io { .. })));
}

#[test]
fn test_deferred_source_needs_an_input() {
    let pipeline = PipelineBuilder::deferred().build().unwrap();
    assert!(matches!(pipeline.run(), Err(GraphError::MissingInput { .. })));

    let file = ndjson_file(&[r#"{"a": 1}"#]);
    let output = pipeline
        .run_with(&RunOptions::new().with_input(file.path()))
        .unwrap();
    assert_eq!(*output, vec![rec(json!({"a": 1}))]);
}

#[test]
fn test_output_sink_writes_ndjson() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.jsonl");
    let pipeline = PipelineBuilder::from_records(numbers()).build().unwrap();
    pipeline
        .run_with(&RunOptions::new().with_output(&out))
        .unwrap();
    assert_eq!(graphflow::io::read_records(&out).unwrap(), numbers());
}

#[test]
fn test_manual_chain_must_reach_source() {
    let mut chain = StageChain::new();
    let source = chain.add(Stage::source(Source::records(numbers())));
    let sort = chain.add(Stage::sort("a").unwrap());
    let result = Pipeline::from_chain(chain, source, sort, None);
    assert!(matches!(result, Err(GraphError::BrokenChain { .. })));
}

#[test]
fn test_manual_chain_builds_pipeline() {
    let mut chain = StageChain::new();
    let source = chain.add(Stage::source(Source::records(vec![
        rec(json!({"a": 2})),
        rec(json!({"a": 1})),
    ])));
    let sort = chain.attach(source, Stage::sort("a").unwrap()).unwrap();
    let pipeline = Pipeline::from_chain(chain, source, sort, Some("manual".to_string())).unwrap();
    assert_eq!(pipeline.label(), "manual");
    assert_eq!(pipeline.run().unwrap()[0]["a"], json!(1));
}

#[test]
fn test_sort_then_group_keeps_large_integers_apart() {
    let big = 1u64 << 53;
    let input = vec![
        rec(json!({"k": big + 1})),
        rec(json!({"k": big})),
        rec(json!({"k": big + 1})),
    ];
    let pipeline = PipelineBuilder::from_records(input)
        .sort("k")
        .reduce("k", |rows: &[Record]| {
            Ok(vec![from_pairs([("k", rows[0]["k"].clone()), ("n", json!(rows.len()))])])
        })
        .build()
        .unwrap();

    assert_eq!(
        *pipeline.run().unwrap(),
        vec![
            rec(json!({"k": big, "n": 1})),
            rec(json!({"k": big + 1, "n": 2})),
        ]
    );
}

#[test]
fn test_whole_stream_reduce_sees_empty_input() {
    let pipeline = PipelineBuilder::from_records(Vec::new())
        .reduce(graphflow::record::KeySet::none(), |rows: &[Record]| {
            Ok(vec![from_pairs([("count", json!(rows.len()))])])
        })
        .build()
        .unwrap();
    assert_eq!(*pipeline.run().unwrap(), vec![rec(json!({"count": 0}))]);
}
