// End-to-end tests for the trigger pipeline
//
// Both channels, the console triggers and the Lua runner are wired together
// in-process; no server is spawned. Scripts live in a temp directory.

use std::io::{BufRead, BufReader, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use craftwrap::console::SharedWriter;
use craftwrap::{
    Console, InterceptedInput, InterceptedOutput, LuaScriptRunner, ScriptRunner, WrapperConfig,
};
use tempfile::TempDir;

type Buffer = Arc<Mutex<Vec<u8>>>;

struct Pipeline {
    input: InterceptedInput,
    output: InterceptedOutput<Vec<u8>>,
    stdout: Buffer,
    stderr: Buffer,
    _console: Console,
    _scripts: TempDir,
}

impl Pipeline {
    fn new(scripts: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        for (name, source) in scripts {
            std::fs::write(dir.path().join(format!("{name}.lua")), source).unwrap();
        }

        let mut input = InterceptedInput::new();
        let mut output = InterceptedOutput::new(Vec::new());
        let stdout: Buffer = Arc::new(Mutex::new(Vec::new()));
        let stderr: Buffer = Arc::new(Mutex::new(Vec::new()));

        let runner: Arc<dyn ScriptRunner> = Arc::new(LuaScriptRunner::new(dir.path(), ".lua"));
        let console = Console::install(
            WrapperConfig::default().triggers().unwrap(),
            runner,
            &mut input,
            &mut output,
            Arc::clone(&stdout) as SharedWriter,
            Arc::clone(&stderr) as SharedWriter,
        )
        .unwrap();

        Self {
            input,
            output,
            stdout,
            stderr,
            _console: console,
            _scripts: dir,
        }
    }

    /// Next line the wrapped server would read.
    fn server_reads(&mut self) -> String {
        let mut line = String::new();
        BufReader::new(&mut self.input).read_line(&mut line).unwrap();
        line.trim_end().to_string()
    }

    /// The server prints `line`.
    fn server_prints(&mut self, line: &str) {
        writeln!(self.output, "{line}").unwrap();
        self.output.flush().unwrap();
    }
}

/// Wait until `buffer` holds some text, up to a few seconds.
fn wait_for_text(buffer: &Buffer) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        if !text.is_empty() || Instant::now() > deadline {
            return text;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

const GREET: &str = r#"
if invoker:is_server() then
  invoker:execute("say Hello " .. args[1])
else
  invoker:execute("say Hello " .. invoker.name)
end
"#;

#[test]
fn test_operator_trigger_runs_script_and_is_hidden() {
    let mut p = Pipeline::new(&[("greet", GREET)]);

    p.input.writeln("!greet Bob");

    // The trigger line is cancelled; the first thing the server sees is the
    // command the script injected.
    assert_eq!(p.server_reads(), "say Hello Bob");
}

#[test]
fn test_player_trigger_runs_as_player() {
    let mut p = Pipeline::new(&[("greet", GREET)]);

    p.server_prints("[12:00:00] [Server thread/INFO]: <Steve> !greet");

    assert_eq!(p.server_reads(), "execute as Steve run say Hello Steve");
    // Output passes through untouched.
    let forwarded = String::from_utf8(p.output.get_ref().clone()).unwrap();
    assert!(forwarded.contains("<Steve> !greet"));
}

#[test]
fn test_non_trigger_lines_pass_through() {
    let mut p = Pipeline::new(&[]);

    p.input.writeln("list");
    p.server_prints("[12:00:00] [Server thread/INFO]: <Steve> hello everyone");
    p.input.writeln("time set day");

    assert_eq!(p.server_reads(), "list");
    assert_eq!(p.server_reads(), "time set day");
}

#[test]
fn test_unknown_script_reported_to_operator() {
    let mut p = Pipeline::new(&[]);

    p.input.writeln("!missing");
    p.input.writeln("list");

    // Reading publishes the trigger line; it is cancelled and the pipeline
    // keeps going.
    assert_eq!(p.server_reads(), "list");
    assert_eq!(wait_for_text(&p.stderr), "Unknown script: missing\n");
    assert!(p.stdout.lock().unwrap().is_empty());
}

#[test]
fn test_unknown_script_reported_to_player() {
    let mut p = Pipeline::new(&[]);

    p.server_prints("[12:00:00] [Server thread/INFO]: <Alex> !missing");

    assert_eq!(
        p.server_reads(),
        r#"tellraw Alex {"text":"Unknown script: missing","color":"red"}"#
    );
}

#[test]
fn test_lua_error_reported_once() {
    let mut p = Pipeline::new(&[("broken", "error('nope')")]);

    p.input.writeln("!broken");
    p.input.writeln("list");

    assert_eq!(p.server_reads(), "list");
    let reported = wait_for_text(&p.stderr);
    assert_eq!(reported.lines().count(), 1);
    assert!(reported.ends_with(":1: nope\n"), "got {reported:?}");
}

#[test]
fn test_script_can_inject_several_commands_in_order() {
    let script = r#"
for i = 1, 3 do
  console.execute("say " .. i)
end
invoker:print("done")
"#;
    let mut p = Pipeline::new(&[("count", script)]);

    p.input.writeln("!count");
    assert_eq!(p.server_reads(), "say 1");
    assert_eq!(p.server_reads(), "say 2");
    assert_eq!(p.server_reads(), "say 3");
    assert_eq!(wait_for_text(&p.stdout), "done\n");
}

#[test]
fn test_sleeping_script_does_not_block_input() {
    let script = r#"
console.sleep(200)
console.execute("say woke up")
"#;
    let mut p = Pipeline::new(&[("nap", script)]);

    p.input.writeln("!nap");
    p.input.writeln("list");

    // "list" is served while the script is still asleep.
    assert_eq!(p.server_reads(), "list");
    assert_eq!(p.server_reads(), "say woke up");
}

#[test]
fn test_player_print_reports_sent_command() {
    let script = r#"
local sent = invoker:print("hi")
console.execute("say " .. sent)
"#;
    let mut p = Pipeline::new(&[("echo", script)]);

    p.server_prints("[12:00:00] [Server thread/INFO]: <Alex> !echo");

    let tellraw = r#"tellraw Alex {"text":"hi","color":"white"}"#;
    assert_eq!(p.server_reads(), tellraw);
    assert_eq!(p.server_reads(), format!("say {tellraw}"));
}
