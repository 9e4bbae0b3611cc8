/// sql generation prompt. inputs are substituted verbatim.
pub fn build_sql_prompt(schema: &str, chat_history: &str, question: &str) -> String {
    format!(
        "You are a Postgres SQL expert. Generate **only one SQL query** for the user's question. \
         Return only a syntactically correct SQL query, no explanations.\n\
         Use the database schema:\n{}\n\n\
         Conversation History:\n{}\n\n\
         Question:\n{}\n\n\
         Respond ONLY with the SQL query enclosed in a single ```sql``` block and nothing else.\n",
        schema, chat_history, question
    )
}

/// answer generation prompt built from the executed query and its output
pub fn build_answer_prompt(
    sql_query: &str,
    results: &str,
    question: &str,
    chat_history: &str,
) -> String {
    format!(
        "You have executed the following SQL query:\n\n\
         SQL Query:\n{}\n\
         Query Output:\n{}\n\n\
         Based on the results (fetched by the user), answer the original question:\n{}\n\n\
         If necessary, use the previous chat history:\n{}\n\n\
         Answer:\n",
        sql_query, results, question, chat_history
    )
}
