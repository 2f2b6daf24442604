mod images;
mod moderation;
mod submissions;
mod upload;
