use crate::support::print_json_or_exit;
use deployops_policy::{PLATFORM_POLICY_LIMIT, Template, measure_policies};
use serde_json::json;

const CHECK_KIND: &str = "ci.policy_length_check.v1";

pub fn run(template_path: String, resources: Vec<String>, max_length: usize, json_output: bool) {
    let template = Template::load(&template_path).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(2);
    });
    let report = measure_policies(&template, &resources, max_length).unwrap_or_else(|err| {
        eprintln!("error: {template_path}: {err}");
        std::process::exit(2);
    });

    for policy in &report.policies {
        if policy.length > PLATFORM_POLICY_LIMIT && !policy.over_limit {
            tracing::warn!(
                logical_id = policy.logical_id.as_str(),
                length = policy.length,
                "policy document is above the platform limit before substitution"
            );
        }
    }

    let accepted = report.accepted();
    let result = if accepted { "accepted" } else { "rejected" };

    if json_output {
        let errors: Vec<String> = report
            .over_limit()
            .map(|policy| {
                format!(
                    "{}: policy document is {} characters (max {})",
                    policy.logical_id, policy.length, report.max_length
                )
            })
            .collect();
        let payload = json!({
            "schema": 1,
            "checkKind": CHECK_KIND,
            "result": result,
            "template": template_path,
            "maxLength": report.max_length,
            "policies": report.policies,
            "errors": errors,
        });
        print_json_or_exit(&payload, "check-policy-length");
    } else {
        let status = if accepted { "OK" } else { "FAIL" };
        println!(
            "[policy-length] {status} (template={template_path}, max={}, policies={})",
            report.max_length,
            report.policies.len()
        );
        for policy in &report.policies {
            let marker = if policy.over_limit { " (over limit)" } else { "" };
            println!("  - {}: {}{marker}", policy.logical_id, policy.length);
        }
    }

    if !accepted {
        std::process::exit(1);
    }
}
