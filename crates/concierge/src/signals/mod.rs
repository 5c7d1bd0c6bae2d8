pub mod sentiment;

pub use sentiment::{analyze, Sentiment, SentimentAnalyzer, SentimentSignal};
