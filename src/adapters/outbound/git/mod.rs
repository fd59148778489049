/// Git adapters for repository cloning
mod git_cloner;

pub use git_cloner::GitCloner;
