//! Size estimation for IAM policy documents embedded in a template.
//!
//! The platform caps managed policies at 6144 characters once whitespace is
//! removed. Templates are measured before substitution, so the default limit
//! sits a little above the hard cap.

use crate::error::PolicyError;
use crate::template::Template;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_TEMPLATE_PATH: &str = "cloudformation/ci_resources.yml";
pub const PLATFORM_POLICY_LIMIT: usize = 6144;
pub const DEFAULT_MAX_POLICY_LENGTH: usize = 6300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyMeasurement {
    pub logical_id: String,
    pub length: usize,
    pub over_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyLengthReport {
    pub max_length: usize,
    pub policies: Vec<PolicyMeasurement>,
}

impl PolicyLengthReport {
    pub fn accepted(&self) -> bool {
        self.policies.iter().all(|policy| !policy.over_limit)
    }

    pub fn over_limit(&self) -> impl Iterator<Item = &PolicyMeasurement> {
        self.policies.iter().filter(|policy| policy.over_limit)
    }
}

/// Characters in the compact JSON rendering of `document`.
pub fn policy_length(document: &Value) -> usize {
    document.to_string().chars().count()
}

/// Measure the selected policy documents against `max_length`.
///
/// An empty `selection` measures every resource that carries a
/// `Properties.PolicyDocument`, in template order.
pub fn measure_policies(
    template: &Template,
    selection: &[String],
    max_length: usize,
) -> Result<PolicyLengthReport, PolicyError> {
    let resources = template.resources()?;
    let mut documents: Vec<(String, &Value)> = Vec::new();

    if selection.is_empty() {
        for (logical_id, resource) in resources {
            if let Some(document) = policy_document(resource) {
                documents.push((logical_id.clone(), document));
            }
        }
    } else {
        for logical_id in selection {
            let resource = resources
                .get(logical_id)
                .ok_or_else(|| PolicyError::ResourceNotFound(logical_id.clone()))?;
            let document = policy_document(resource)
                .ok_or_else(|| PolicyError::NoPolicyDocument(logical_id.clone()))?;
            documents.push((logical_id.clone(), document));
        }
    }

    let policies = documents
        .into_iter()
        .map(|(logical_id, document)| {
            let length = policy_length(document);
            tracing::debug!(logical_id = logical_id.as_str(), length, "measured policy document");
            PolicyMeasurement {
                logical_id,
                length,
                over_limit: length > max_length,
            }
        })
        .collect();

    Ok(PolicyLengthReport {
        max_length,
        policies,
    })
}

fn policy_document(resource: &Value) -> Option<&Value> {
    resource.get("Properties")?.get("PolicyDocument")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(text: &str) -> Template {
        Template::from_yaml(serde_yaml::from_str(text).expect("valid yaml")).expect("converts")
    }

    const TEMPLATE: &str = r#"
Resources:
  Bucket:
    Type: AWS::S3::Bucket
  PolicyA:
    Type: AWS::IAM::ManagedPolicy
    Properties:
      PolicyDocument:
        Version: "2012-10-17"
        Statement:
          - Effect: Allow
            Action: s3:GetObject
            Resource: !Sub "arn:aws:s3:::${Bucket}/*"
  PolicyB:
    Type: AWS::IAM::ManagedPolicy
    Properties:
      PolicyDocument:
        Version: "2012-10-17"
        Statement: []
"#;

    #[test]
    fn length_is_compact_json_characters() {
        assert_eq!(policy_length(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#.len());
    }

    #[test]
    fn default_selection_finds_every_policy_document() {
        let report = measure_policies(&template(TEMPLATE), &[], DEFAULT_MAX_POLICY_LENGTH)
            .expect("measures");
        let ids: Vec<&str> = report
            .policies
            .iter()
            .map(|p| p.logical_id.as_str())
            .collect();
        assert_eq!(ids, vec!["PolicyA", "PolicyB"]);
        assert!(report.accepted());
        assert_eq!(
            report.policies[1].length,
            r#"{"Version":"2012-10-17","Statement":[]}"#.len()
        );
    }

    #[test]
    fn documents_over_the_limit_reject() {
        let template = template(TEMPLATE);
        let short = measure_policies(&template, &["PolicyB".to_string()], 1000).expect("measures");
        assert!(short.accepted());

        let report = measure_policies(&template, &[], 50).expect("measures");
        assert!(!report.accepted());
        let over: Vec<&str> = report.over_limit().map(|p| p.logical_id.as_str()).collect();
        assert_eq!(over, vec!["PolicyA"]);
    }

    #[test]
    fn explicit_selection_requires_policy_documents() {
        let template = template(TEMPLATE);
        assert!(matches!(
            measure_policies(&template, &["Missing".to_string()], 10),
            Err(PolicyError::ResourceNotFound(id)) if id == "Missing"
        ));
        assert!(matches!(
            measure_policies(&template, &["Bucket".to_string()], 10),
            Err(PolicyError::NoPolicyDocument(id)) if id == "Bucket"
        ));
    }
}
