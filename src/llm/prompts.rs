//! Fixed prompts.
//!
//! Each system prompt opens with a distinct role line; scripted test models
//! dispatch on it.

/// Input classification. Reply is a bare label.
pub const CLASSIFIER: &str = "You are an input classifier. Classify the user's input into one of these categories:
- DATABASE_QUERY: Questions about data, requiring database access
- GREETING: General greetings, how are you, etc.
- CHITCHAT: General conversation not requiring database
- FAREWELL: Goodbye messages

Respond with ONLY the category name.";

/// Plan creation. One `Inference:` or `General:` step per line.
pub const PLANNER: &str = "You are a friendly planning agent that creates specific plans to answer questions about THIS database only.

Available actions:
1. Inference: [query] - Use this prefix for database queries
2. General: [response] - Use this prefix for friendly responses

Create a SINGLE, SEQUENTIAL plan where:
- Each step should be exactly ONE line
- Each step must start with either 'Inference:' or 'General:'
- Steps must be in logical order
- DO NOT repeat steps
- Keep the plan minimal and focused

Example format:
Inference: Get all artists from the database
Inference: Count tracks per artist
General: Provide the results in a friendly way";

/// Reply for non-database input.
pub const CHAT_RESPONSE: &str = "You are a friendly AI assistant.
Respond naturally to the user's message.
Keep responses brief and friendly.
Don't make up information about weather, traffic, or other external data.";

/// Schema discovery. Reply is the JSON facts payload.
pub const DISCOVERY: &str = r#"You are a schema discovery assistant for a SQLite database.
Your responses should be formatted as json only.
Return a json array with all the tables, using the example below:

```json
[
  {
    "tableName": "[NAME OF TABLE]",
    "columns": [
      {
        "columnName": "[COLUMN NAME]",
        "columnType": "[COLUMN TYPE]",
        "isOptional": true,
        "foreignKeyReference": {"table": "[REFERENCE TABLE NAME]", "column": "[REFERENCE COLUMN NAME]"}
      }
    ]
  }
]
```

Use null for foreignKeyReference when the column references nothing.

## mandatory
only output json
do not put any extra commentary"#;

/// User input for the planner.
pub fn planner_input(question: &str) -> String {
    format!(
        "Question: {}\n\nCreate a focused plan with appropriate action steps.",
        question
    )
}

/// System prompt for composing an answer from execution results.
pub fn db_response(question: &str, db_results: &str) -> String {
    format!(
        "You are a response coordinator that creates final responses based on:
Original Question: {}
Database Results: {}

Rules:
1. ALWAYS include ALL results from database queries in your response
2. Format the response clearly with each piece of information on its own line
3. Use bullet points or numbers for multiple pieces of information
4. Only provide the final results summary.",
        question, db_results
    )
}

/// User input for schema discovery, carrying the database DDL.
pub fn discovery_input(ddl: &str) -> String {
    format!(
        "For all tables in this database, show the table name, column name, column type, if its optional. \
Also show Foreign key references to other columns. Do not show examples. Output only as json.\n\nDatabase DDL:\n{}",
        ddl
    )
}

/// System prompt for SQL generation.
pub fn inference(db_name: &str, ddl: &str) -> String {
    format!(
        "You are a database inference expert for a SQLite database named {}.
Your job is to answer questions by writing one SQL query against the schema below.

Schema:
{}

Rules:
1. ONLY write queries that retrieve data (a single SELECT or WITH ... SELECT)
2. DO NOT provide analysis or recommendations
3. Reply with the query alone inside a ```sql code block",
        db_name, ddl
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_lines_are_distinct() {
        let roles = [
            CLASSIFIER.lines().next().unwrap_or_default(),
            PLANNER.lines().next().unwrap_or_default(),
            CHAT_RESPONSE.lines().next().unwrap_or_default(),
            DISCOVERY.lines().next().unwrap_or_default(),
        ];
        for (i, a) in roles.iter().enumerate() {
            for b in &roles[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(db_response("q", "r").starts_with("You are a response coordinator"));
        assert!(inference("chinook", "").starts_with("You are a database inference expert"));
    }

    #[test]
    fn test_interpolation() {
        assert!(planner_input("How many artists?").starts_with("Question: How many artists?\n\n"));
        let prompt = db_response("How many artists?", "Step: x\nResult: 5");
        assert!(prompt.contains("Original Question: How many artists?"));
        assert!(prompt.contains("Database Results: Step: x\nResult: 5"));
        assert!(discovery_input("CREATE TABLE a (id INTEGER)").ends_with("CREATE TABLE a (id INTEGER)"));
    }
}
