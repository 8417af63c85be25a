use agentloop::{
    agent::{initialize_agent, EarlyStoppingMethod, ExecutorOptions},
    llm::openai::{OpenAI, OpenAIModel},
    text_replacements,
    tools::{Calculator, CommandExecutor, Tool},
};

#[tokio::main]
async fn main() {
    let llm = OpenAI::builder().with_model(OpenAIModel::Gpt4oMini).build();
    let tools = vec![
        Calculator::default().into_shared(),
        CommandExecutor::default().into_shared(),
    ];
    let options = ExecutorOptions::default()
        .with_max_iterations(5)
        .with_early_stopping_method(EarlyStoppingMethod::Generate)
        .with_return_intermediate_steps(true);

    let executor = initialize_agent("qa-bot", tools, llm, options).unwrap();

    let inputs = text_replacements! {
        "input" => "How many files are in the current directory, times 7?",
    };

    match executor.run(inputs).await {
        Ok(result) => {
            for step in result.intermediate_steps.clone().unwrap_or_default() {
                println!("{} -> {}", step.action, step.observation);
            }
            println!("Result: {:?}", result.output());
        }
        Err(e) => panic!("Error running agent: {:?}", e),
    }
}
