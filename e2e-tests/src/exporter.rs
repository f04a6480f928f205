use std::{
    collections::HashMap,
    env, fs, io,
    sync::{Arc, Mutex},
};

use seqbench::{
    reporter::{Reporter, SessionReporter},
    SessionId, SessionOutput,
};

pub const EXPORTER_OUTPUT_VAR: &str = "SEQBENCH_OUTPUTS_JSON";

type Outputs = Arc<Mutex<HashMap<String, SessionOutput>>>;

/// Collects session outputs and writes them as JSON to the path specified by [`EXPORTER_OUTPUT_VAR`].
#[derive(Debug, Default)]
pub(crate) struct SessionExporter {
    outputs: Outputs,
}

#[derive(Debug)]
struct ExportingSession {
    outputs: Outputs,
    id: String,
}

impl SessionReporter for ExportingSession {
    fn ok(self: Box<Self>, output: &SessionOutput) {
        self.outputs.lock().unwrap().insert(self.id, output.clone());
    }
}

impl Reporter for SessionExporter {
    fn new_session(&mut self, id: &SessionId) -> Box<dyn SessionReporter> {
        Box::new(ExportingSession {
            outputs: self.outputs.clone(),
            id: id.to_string(),
        })
    }
}

impl Drop for SessionExporter {
    fn drop(&mut self) {
        let Ok(out_path) = env::var(EXPORTER_OUTPUT_VAR) else {
            return;
        };
        let out_file = fs::File::create(&out_path).unwrap_or_else(|err| {
            panic!("Failed writing outputs to `{out_path}`: {err}");
        });
        let out_file = io::BufWriter::new(out_file);
        let outputs = self.outputs.lock().unwrap();
        serde_json::to_writer_pretty(out_file, &*outputs).expect("failed exporting results");
    }
}
