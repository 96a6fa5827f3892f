use deployops_params::{OutputEncoding, ParameterRequest, Rendered, resolve_request};
use std::path::PathBuf;

pub struct Args {
    pub environment: String,
    pub stack: String,
    pub secrets: String,
    pub variables: String,
    pub output: OutputEncoding,
    pub config_dir: String,
    pub out_dir: String,
}

pub fn run(args: Args) {
    let request = ParameterRequest {
        environment: args.environment,
        stack: args.stack,
        config_dir: PathBuf::from(args.config_dir),
        out_dir: PathBuf::from(args.out_dir),
        encoding: args.output,
        secrets_json: args.secrets,
        variables_json: args.variables,
    };

    // Callers capture stdout, so fatal diagnostics go there too.
    let outcome = resolve_request(&request).unwrap_or_else(|err| {
        println!("error: {err}");
        std::process::exit(1);
    });

    tracing::info!(
        environment = request.environment.as_str(),
        stack = request.stack.as_str(),
        encoding = %request.encoding,
        resolved = outcome.resolved,
        skipped = outcome.skipped.len(),
        "resolved parameters"
    );

    match outcome.rendered {
        Rendered::Text(text) => println!("{text}"),
        Rendered::File(file) => {
            tracing::info!(
                sha256 = file.sha256.as_str(),
                records = file.records,
                "wrote parameters file"
            );
            println!("{}", file.path.display());
        }
    }
}
