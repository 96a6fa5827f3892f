pub mod check_policy_length;
pub mod check_replacements;
pub mod parse_parameters;
pub mod provision_account_secrets;
pub mod provision_repos;
