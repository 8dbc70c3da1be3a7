pub mod home_assistant;
