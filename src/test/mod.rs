mod controller;
mod packet;
mod simulator;
