use strum::{Display, EnumString};

/// Chat models known to work with the ReAct text protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum OpenAIModel {
    #[strum(serialize = "gpt-3.5-turbo")]
    Gpt35,
    #[strum(serialize = "gpt-4")]
    Gpt4,
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-4.1-mini")]
    Gpt41Mini,
}

impl From<OpenAIModel> for String {
    fn from(model: OpenAIModel) -> Self {
        model.to_string()
    }
}
