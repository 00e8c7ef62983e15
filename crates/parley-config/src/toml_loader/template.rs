//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Parley Configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# host = "0.0.0.0"
# port = 5000
# outbound_capacity = 256      # 1-65536, events queued per connection
# command_capacity = 1024      # 1-65536, events queued for the coordinator
# handshake_timeout_secs = 10  # 1-300

[discussion]
# prep_duration_secs = 40      # 1-3600
# default_display_name = "Anonymous"
# topics = [
#   "Impact of remote learning on education",
#   "AI in modern education systems",
#   "Climate change and sustainable solutions",
#   "The future of work and automation",
#   "Social media's impact on mental health",
#   "Importance of soft skills in careers",
#   "Ethics of artificial intelligence",
#   "Digital privacy in the modern age",
# ]

[logging]
# filter = "parley_relay=info,parley_session=info"   # RUST_LOG overrides this

[stats]
# interval_secs = 60           # 1-86400
"##
    .to_string()
}
