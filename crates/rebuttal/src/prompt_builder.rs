// crates/rebuttal/src/prompt_builder.rs

use retort_core::{GenerationRequest, REPLY_COUNT};

use crate::tone::TONE_DESCRIPTORS;

/// Upper bound on reply length the model is asked to respect, in characters.
pub const MAX_REPLY_CHARS: usize = 50;

/// System and user instructions for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    tones: &'static [&'static str; 10],
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            tones: &TONE_DESCRIPTORS,
        }
    }

    pub fn with_tones(tones: &'static [&'static str; 10]) -> Self {
        Self { tones }
    }

    pub fn build(&self, request: &GenerationRequest) -> PromptPair {
        PromptPair {
            system: self.build_system_prompt(request),
            user: self.build_user_prompt(request),
        }
    }

    pub fn build_system_prompt(&self, request: &GenerationRequest) -> String {
        let intensity = request.intensity();
        let tone = self.tones[intensity.index()];

        format!(
            "你是一个专业的吵架助手，擅长用巧妙、机智的方式回应他人。你需要{tone}回应用户提供的话。\n\
             \n\
             要求：\n\
             1. 生成{count}条不同风格的回复，每条回复独立成句\n\
             2. 回复要有理有据，逻辑清晰，不要单纯辱骂\n\
             3. 可以使用幽默、讽刺、反问等修辞手法\n\
             4. 根据强度等级{level}调整语气的激烈程度\n\
             5. 每条回复控制在{max_chars}字以内\n\
             6. 回复要接地气，符合中文表达习惯\n\
             7. 直接返回{count}条回复，用换行符分隔，不要加序号或其他标记\n\
             \n\
             请直接生成{count}条回复内容，每条一行。",
            tone = tone,
            count = REPLY_COUNT,
            level = intensity,
            max_chars = MAX_REPLY_CHARS,
        )
    }

    pub fn build_user_prompt(&self, request: &GenerationRequest) -> String {
        format!(
            "对方说：{utterance}\n\n请生成{count}条回复。",
            utterance = request.utterance(),
            count = REPLY_COUNT,
        )
    }
}
