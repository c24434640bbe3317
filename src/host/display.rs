//! Human-readable labels for tool activity.

use serde_json::Value;

use crate::store::ToolActivity;

/// Short status-bar label for a tool invocation, e.g. "Reading main.rs".
pub fn tool_label(tool_name: &str, tool_input: &Value) -> String {
    let file = file_name_from_input(tool_input);

    match tool_name {
        "Read" => file
            .map(|f| format!("Reading {f}"))
            .unwrap_or_else(|| "Reading file".to_string()),
        "Edit" => file
            .map(|f| format!("Editing {f}"))
            .unwrap_or_else(|| "Editing file".to_string()),
        "Write" => file
            .map(|f| format!("Writing {f}"))
            .unwrap_or_else(|| "Writing file".to_string()),
        "Bash" => "Running command".to_string(),
        "Glob" => "Searching files".to_string(),
        "Grep" => "Searching code".to_string(),
        "TodoWrite" => "Updating tasks".to_string(),
        "Task" => "Running subagent".to_string(),
        "WebSearch" => "Searching web".to_string(),
        "WebFetch" => "Fetching page".to_string(),
        other => other.to_string(),
    }
}

/// Label for an in-flight [`ToolActivity`].
pub fn activity_label(activity: &ToolActivity) -> String {
    tool_label(&activity.tool_name, &activity.tool_input)
}

fn file_name_from_input(input: &Value) -> Option<&str> {
    let path = input
        .get("file_path")
        .and_then(Value::as_str)
        .or_else(|| input.get("path").and_then(Value::as_str))?;
    path.rsplit('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_tools_show_file_name() {
        assert_eq!(
            tool_label("Read", &json!({"file_path": "/src/main.rs"})),
            "Reading main.rs"
        );
        assert_eq!(
            tool_label("Edit", &json!({"path": "/a/b/lib.rs"})),
            "Editing lib.rs"
        );
        assert_eq!(tool_label("Write", &json!({})), "Writing file");
    }

    #[test]
    fn known_tools_have_fixed_labels() {
        assert_eq!(tool_label("Bash", &json!({"command": "ls"})), "Running command");
        assert_eq!(tool_label("Grep", &json!({})), "Searching code");
    }

    #[test]
    fn unknown_tools_fall_back_to_name() {
        assert_eq!(tool_label("mcp__custom", &json!({})), "mcp__custom");
    }
}
