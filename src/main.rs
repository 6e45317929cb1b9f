extern crate ansi_term;
extern crate clap;
extern crate dirs;
extern crate rubytree;
extern crate rustyline;

use clap::*;
mod repl;
use repl::*;
use rubytree::loader::load_file;
use rubytree::*;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Stack of the interpreter thread. Deeper recursion grows onto the heap.
const STACK_SIZE: usize = 256 * 1024 * 1024;

fn main() {
    let app = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .setting(AppSettings::TrailingVarArg)
        .arg(Arg::from_usage("[exec] -e 'Eval string as program'").takes_value(true))
        .arg(Arg::from_usage("[verbose] -v 'Show version'"))
        .arg(Arg::from_usage("[dump-ast] --dump-ast 'Print the parsed AST instead of running'"))
        .arg(Arg::from_usage("[file]... 'Input file name and arguments'").multiple(true));
    let m = app.get_matches();
    init_tracing();

    let exec = m.value_of("exec").map(str::to_string);
    let verbose = m.is_present("verbose");
    let dump_ast = m.is_present("dump-ast");
    let args: Vec<String> = match m.values_of("file") {
        Some(val) => val.map(str::to_string).collect(),
        None => vec![],
    };

    let child = std::thread::Builder::new()
        .name("rubytree".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || run_main(exec, verbose, dump_ast, args));
    let code = match child.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => 101,
        Err(err) => {
            eprintln!("rubytree: failed to start interpreter thread: {}", err);
            1
        }
    };
    std::process::exit(code);
}

/// Logging is off unless `RUST_LOG` is set.
fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();
}

fn run_main(exec: Option<String>, verbose: bool, dump_ast: bool, args: Vec<String>) -> i32 {
    if verbose {
        println!("{} {}", crate_name!(), crate_version!());
    }
    let mut eval = Evaluator::new();

    if let Some(command) = exec {
        set_argv(&mut eval, &args);
        return execute(&mut eval, "-e", &command, dump_ast);
    }

    if args.is_empty() {
        if verbose {
            return 0;
        }
        set_argv(&mut eval, &[]);
        repl(eval);
        return 0;
    }

    set_argv(&mut eval, &args[1..]);
    let (absolute_path, program) = match load_file(&args[0]) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("rubytree: {}", err);
            return 1;
        }
    };
    let path = absolute_path.to_string_lossy().into_owned();
    execute(&mut eval, &path, &program, dump_ast)
}

fn set_argv(eval: &mut Evaluator, args: &[String]) {
    let argv: Vec<Value> = args.iter().map(|arg| eval.new_string(arg.as_str())).collect();
    let argv = eval.new_array(argv);
    let id = eval.get_ident_id("ARGV");
    eval.const_table.insert(id, argv);
}

fn execute(eval: &mut Evaluator, path: &str, program: &str, dump_ast: bool) -> i32 {
    let res = if dump_ast {
        eval.parse_with_path(program, path).map(|node| {
            println!("{}", node.dump(&eval.ident_table));
            Value::Nil
        })
    } else {
        eval.run_with_path(program, path)
    };
    match res {
        Ok(_) => 0,
        Err(err) => {
            eval.show_error(&err);
            1
        }
    }
}
