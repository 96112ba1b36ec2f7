#![no_main]

use fc_core::{EntityKind, RunConfig};
use fc_emit::{OutputLayout, emit_catalog};
use fc_graph::CatalogCompiler;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let config = RunConfig::default();
    let Ok(graph) = CatalogCompiler::default().compile_all([("fuzz.mmd", input)], &config) else {
        return;
    };
    for (key, entity) in &graph.entities {
        for (_, target) in entity.relations.iter() {
            assert_ne!(target, key);
            assert_ne!(target.kind, EntityKind::User);
            assert_ne!(key.kind, EntityKind::User);
        }
    }
    let _ = emit_catalog(&graph, &config, OutputLayout::Bundle);
});
